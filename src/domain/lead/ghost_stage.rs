//! Re-engagement stage of a lead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// How far the staged re-engagement of an inactive lead has progressed.
///
/// Ordered: `None < FastSent < ValueSent`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum GhostStage {
    #[default]
    None,
    FastSent,
    ValueSent,
}

impl GhostStage {
    pub const ALL: [GhostStage; 3] = [Self::None, Self::FastSent, Self::ValueSent];

    /// Canonical persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FastSent => "fast_sent",
            Self::ValueSent => "value_sent",
        }
    }
}

impl StateMachine for GhostStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self < target
    }

    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL.into_iter().filter(|s| self < s).collect()
    }
}

impl fmt::Display for GhostStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GhostStage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("ghost_stage", format!("unknown stage '{}'", s))
            })
    }
}
