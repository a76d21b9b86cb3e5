//! Language code value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A lowercase ISO-639-1 style language code ("en", "ru", "ar").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Creates a language from a code, normalizing to lowercase.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim().to_lowercase();
        if code.is_empty() {
            return Err(ValidationError::empty_field("language"));
        }
        if code.len() > 8 || !code.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(ValidationError::invalid_format(
                "language",
                format!("'{}' is not a language code", code),
            ));
        }
        Ok(Self(code))
    }

    /// English, the fallback language.
    pub fn english() -> Self {
        Self("en".to_string())
    }

    /// Returns the code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw code.
    pub fn matches(&self, code: &str) -> bool {
        self.0.eq_ignore_ascii_case(code.trim())
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Language {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_lowercase() {
        assert_eq!(Language::new(" RU ").unwrap().as_str(), "ru");
    }

    #[test]
    fn rejects_empty_and_numeric_codes() {
        assert!(Language::new("").is_err());
        assert!(Language::new("e1").is_err());
    }

    #[test]
    fn matches_ignores_case() {
        assert!(Language::english().matches("EN"));
        assert!(!Language::english().matches("ru"));
    }

    #[test]
    fn deserializes_through_validation() {
        let lang: Language = serde_json::from_str("\"AR\"").unwrap();
        assert_eq!(lang.as_str(), "ar");
        assert!(serde_json::from_str::<Language>("\"\"").is_err());
    }
}
