//! Urgency score value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// How hot a lead is, from 0 (cold) to 10 (ready to buy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UrgencyScore(u8);

impl UrgencyScore {
    pub const MAX: u8 = 10;

    /// Creates a score, rejecting values above [`UrgencyScore::MAX`].
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::out_of_range(
                "urgency_score",
                0,
                Self::MAX as i64,
                value as i64,
            ));
        }
        Ok(Self(value))
    }

    /// Raises the score by `points`, saturating at the maximum.
    pub fn bumped(self, points: u8) -> Self {
        Self(self.0.saturating_add(points).min(Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for UrgencyScore {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UrgencyScore> for u8 {
    fn from(score: UrgencyScore) -> Self {
        score.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_above_ten() {
        assert!(UrgencyScore::new(10).is_ok());
        assert!(UrgencyScore::new(11).is_err());
    }

    #[test]
    fn bump_saturates_at_ten() {
        let mut score = UrgencyScore::default();
        for _ in 0..25 {
            score = score.bumped(2);
        }
        assert_eq!(score.value(), 10);
    }

    #[test]
    fn bump_handles_u8_overflow() {
        assert_eq!(UrgencyScore::new(9).unwrap().bumped(u8::MAX).value(), 10);
    }
}
