//! State machine trait for string-backed lifecycle enums.
//!
//! Implemented by the conversation state and the ghost stage so that every
//! writer validates its transition the same way before persisting it.

use super::ValidationError;

/// Trait for enums whose values move through a fixed transition graph.
///
/// # Example
///
/// ```ignore
/// let next = GhostStage::None.transition_to(GhostStage::FastSent)?;
/// assert!(GhostStage::ValueSent.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
