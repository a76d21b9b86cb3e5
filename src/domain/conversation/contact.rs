//! Contact capture: `<name> <separator> <international phone>`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Literal example shown when a contact message cannot be parsed.
pub const CONTACT_EXAMPLE: &str = "John Doe - +971501234567";

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PHONE_DIGITS: usize = 8;
pub const MAX_PHONE_DIGITS: usize = 15;

// The name is lazy so that hyphenated names keep their hyphen: the separator
// is the last one directly followed by a `+` phone.
static CONTACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<name>.+?)\s*[-–—,;:|/]\s*(?P<phone>\+[0-9\s().\-]+?)\s*$")
        .expect("contact pattern is valid")
});

/// Parsed contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    /// Normalized phone: `+` followed by digits only.
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("expected '<name> - <phone>'")]
    Format,

    #[error("name must have at least {MIN_NAME_CHARS} characters")]
    NameTooShort,

    #[error("name must not contain digits")]
    NameHasDigits,

    #[error("phone must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits, got {0}")]
    PhoneLength(usize),
}

/// Parses a contact message.
pub fn parse_contact(input: &str) -> Result<ContactDetails, ContactError> {
    let caps = CONTACT.captures(input).ok_or(ContactError::Format)?;

    let name = caps["name"].split_whitespace().collect::<Vec<_>>().join(" ");
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(ContactError::NameHasDigits);
    }
    if name.chars().filter(|c| c.is_alphabetic()).count() < MIN_NAME_CHARS {
        return Err(ContactError::NameTooShort);
    }

    let digits: String = caps["phone"].chars().filter(|c| c.is_ascii_digit()).collect();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ContactError::PhoneLength(digits.len()));
    }

    Ok(ContactDetails {
        name,
        phone: format!("+{digits}"),
    })
}
