//! Qualification attributes a lead states during the conversation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Generates the canonical-string plumbing shared by qualification enums:
/// `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! string_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical persisted representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValidationError::invalid_format(
                        $field,
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }
    };
}

/// A stated budget. Written as a whole, so a new answer replaces both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// Why the lead is looking at property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Investment,
    Living,
}

string_enum!(Purpose, "purpose", {
    Investment => "investment",
    Living => "living",
});

/// Whether the lead wants to buy or rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Rent,
}

string_enum!(TransactionType, "transaction_type", {
    Buy => "buy",
    Rent => "rent",
});

/// Kind of property the lead is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    Townhouse,
    Penthouse,
    Commercial,
}

string_enum!(PropertyType, "property_type", {
    Apartment => "apartment",
    Villa => "villa",
    Townhouse => "townhouse",
    Penthouse => "penthouse",
    Commercial => "commercial",
});

/// Goal chosen at the goal-selection step.
///
/// A goal fixes both the purpose and the transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Invest,
    Live,
    Rent,
}

string_enum!(Goal, "goal", {
    Invest => "invest",
    Live => "live",
    Rent => "rent",
});

impl Goal {
    pub fn purpose(&self) -> Purpose {
        match self {
            Goal::Invest => Purpose::Investment,
            Goal::Live | Goal::Rent => Purpose::Living,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Goal::Invest | Goal::Live => TransactionType::Buy,
            Goal::Rent => TransactionType::Rent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualification_values_round_trip() {
        for p in Purpose::ALL {
            assert_eq!(p.as_str().parse::<Purpose>().unwrap(), *p);
        }
        for t in PropertyType::ALL {
            assert_eq!(t.as_str().parse::<PropertyType>().unwrap(), *t);
            assert_eq!(serde_json::to_string(t).unwrap(), format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn unknown_value_names_the_field() {
        let err = "castle".parse::<PropertyType>().unwrap_err();
        assert!(err.to_string().contains("property_type"));
    }

    #[test]
    fn goal_maps_to_purpose_and_transaction() {
        assert_eq!(Goal::Invest.purpose(), Purpose::Investment);
        assert_eq!(Goal::Rent.purpose(), Purpose::Living);
        assert_eq!(Goal::Rent.transaction_type(), TransactionType::Rent);
        assert_eq!(Goal::Live.transaction_type(), TransactionType::Buy);
    }
}
