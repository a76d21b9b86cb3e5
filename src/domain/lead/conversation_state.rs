//! Conversation state of a lead.
//!
//! Persisted as the canonical lowercase string returned by [`ConversationState::as_str`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Where a lead is in the qualification funnel.
///
/// ```text
/// Start -> LanguageSelect -> GoalSelect -> CaptureContact
///       -> {Budget | PropertyType} -> ValueProposition -> HardGate
///       -> BookingSlot -> Booked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Start,
    LanguageSelect,
    GoalSelect,
    CaptureContact,
    Budget,
    PropertyType,
    ValueProposition,
    HardGate,
    BookingSlot,
    Booked,
}

impl ConversationState {
    /// All states in funnel order.
    pub const ALL: [ConversationState; 10] = [
        Self::Start,
        Self::LanguageSelect,
        Self::GoalSelect,
        Self::CaptureContact,
        Self::Budget,
        Self::PropertyType,
        Self::ValueProposition,
        Self::HardGate,
        Self::BookingSlot,
        Self::Booked,
    ];

    /// Canonical persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::LanguageSelect => "language_select",
            Self::GoalSelect => "goal_select",
            Self::CaptureContact => "capture_contact",
            Self::Budget => "budget",
            Self::PropertyType => "property_type",
            Self::ValueProposition => "value_proposition",
            Self::HardGate => "hard_gate",
            Self::BookingSlot => "booking_slot",
            Self::Booked => "booked",
        }
    }

    /// Returns true once the lead has booked a viewing.
    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Booked)
    }
}

impl StateMachine for ConversationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationState::*;
        // Any live conversation may be restarted at language selection.
        if *self != Booked && *target == LanguageSelect {
            return true;
        }
        matches!(
            (self, target),
            (Start, LanguageSelect)
                | (LanguageSelect, GoalSelect)
                | (GoalSelect, CaptureContact)
                | (CaptureContact, CaptureContact)
                | (CaptureContact, Budget)
                | (CaptureContact, PropertyType)
                | (Budget, PropertyType)
                | (Budget, ValueProposition)
                | (PropertyType, Budget)
                | (PropertyType, ValueProposition)
                | (ValueProposition, ValueProposition)
                | (ValueProposition, HardGate)
                | (HardGate, HardGate)
                | (HardGate, BookingSlot)
                | (BookingSlot, Booked)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "conversation_state",
                    format!("unknown state '{}'", s),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod persistence {
        use super::*;

        #[test]
        fn default_state_is_start() {
            assert_eq!(ConversationState::default(), ConversationState::Start);
        }

        #[test]
        fn every_state_round_trips_through_its_string() {
            for state in ConversationState::ALL {
                assert_eq!(state.as_str().parse::<ConversationState>().unwrap(), state);
            }
        }

        #[test]
        fn serde_uses_the_canonical_string() {
            for state in ConversationState::ALL {
                let json = serde_json::to_string(&state).unwrap();
                assert_eq!(json, format!("\"{}\"", state.as_str()));
            }
        }

        #[test]
        fn uppercase_names_are_rejected() {
            assert!("CAPTURE_CONTACT".parse::<ConversationState>().is_err());
            assert!(serde_json::from_str::<ConversationState>("\"BOOKED\"").is_err());
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn booked_is_terminal() {
            assert!(ConversationState::Booked.is_terminal());
            assert!(!ConversationState::Start.is_terminal());
        }

        #[test]
        fn capture_contact_branches_and_self_loops() {
            let targets = ConversationState::CaptureContact.valid_transitions();
            assert!(targets.contains(&ConversationState::CaptureContact));
            assert!(targets.contains(&ConversationState::Budget));
            assert!(targets.contains(&ConversationState::PropertyType));
        }

        #[test]
        fn cannot_skip_contact_capture() {
            assert!(ConversationState::GoalSelect
                .transition_to(ConversationState::Budget)
                .is_err());
        }

        #[test]
        fn restart_is_allowed_until_booked() {
            assert!(ConversationState::HardGate.can_transition_to(&ConversationState::LanguageSelect));
            assert!(!ConversationState::Booked.can_transition_to(&ConversationState::LanguageSelect));
        }
    }
}
