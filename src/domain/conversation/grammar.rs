//! Per-step input grammars and the quick-reply buttons that feed them.
//!
//! Each step accepts its own button payloads plus a small free-text
//! vocabulary. A `None` from any parser means "does not match this step".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::foundation::Language;
use crate::domain::lead::{BudgetRange, Goal, PropertyType};
use crate::domain::tenant::TenantConfig;

use super::{Button, Input};

pub const LANG_PREFIX: &str = "lang_";
pub const GOAL_PREFIX: &str = "goal_";
pub const BUDGET_PREFIX: &str = "budget_";
pub const PTYPE_PREFIX: &str = "ptype_";
pub const SLOT_PREFIX: &str = "slot_";

pub const VP_MORE: &str = "vp_more";
pub const VP_INTERESTED: &str = "vp_interested";
pub const GATE_BOOK: &str = "gate_book";
pub const GATE_LATER: &str = "gate_later";

/// Display names accepted as free text for well-known language codes.
const LANGUAGE_NAMES: &[(&str, &[&str])] = &[
    ("en", &["english"]),
    ("ru", &["russian", "русский"]),
    ("ar", &["arabic", "العربية"]),
    ("de", &["german", "deutsch"]),
    ("fr", &["french", "français", "francais"]),
    ("es", &["spanish", "español", "espanol"]),
];

/// A predefined budget range offered as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetBracket {
    pub label: &'static str,
    pub min: Option<u64>,
    pub max: Option<u64>,
}

pub const BUDGET_BRACKETS: [BudgetBracket; 4] = [
    BudgetBracket {
        label: "Up to 500K",
        min: None,
        max: Some(500_000),
    },
    BudgetBracket {
        label: "500K - 1M",
        min: Some(500_000),
        max: Some(1_000_000),
    },
    BudgetBracket {
        label: "1M - 3M",
        min: Some(1_000_000),
        max: Some(3_000_000),
    },
    BudgetBracket {
        label: "3M+",
        min: Some(3_000_000),
        max: None,
    },
];


/// Choice on the value-proposition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueChoice {
    More,
    Interested,
}

/// Choice on the hard gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChoice {
    Book,
    Later,
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

pub fn language_buttons(config: &TenantConfig) -> Vec<Button> {
    config
        .supported_languages
        .iter()
        .map(|lang| Button::new(language_label(lang), format!("{LANG_PREFIX}{}", lang.as_str())))
        .collect()
}

pub fn goal_buttons() -> Vec<Button> {
    Goal::ALL
        .iter()
        .map(|goal| {
            let label = match goal {
                Goal::Invest => "Invest",
                Goal::Live => "Live",
                Goal::Rent => "Rent",
            };
            Button::new(label, format!("{GOAL_PREFIX}{}", goal.as_str()))
        })
        .collect()
}

pub fn budget_buttons() -> Vec<Button> {
    BUDGET_BRACKETS
        .iter()
        .enumerate()
        .map(|(i, bracket)| Button::new(bracket.label, format!("{BUDGET_PREFIX}{i}")))
        .collect()
}

pub fn property_type_buttons() -> Vec<Button> {
    PropertyType::ALL
        .iter()
        .map(|kind| Button::new(capitalize(kind.as_str()), format!("{PTYPE_PREFIX}{}", kind.as_str())))
        .collect()
}

pub fn value_buttons() -> Vec<Button> {
    vec![
        Button::new("I'm interested", VP_INTERESTED),
        Button::new("Show me more", VP_MORE),
    ]
}

pub fn gate_buttons() -> Vec<Button> {
    vec![
        Button::new("Book a call", GATE_BOOK),
        Button::new("Maybe later", GATE_LATER),
    ]
}

pub fn slot_buttons(config: &TenantConfig) -> Vec<Button> {
    config
        .booking_slots
        .iter()
        .enumerate()
        .map(|(i, slot)| Button::new(slot.clone(), format!("{SLOT_PREFIX}{i}")))
        .collect()
}

fn language_label(language: &Language) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| language.matches(code))
        .map(|(_, names)| capitalize(names[0]))
        .unwrap_or_else(|| language.as_str().to_uppercase())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_word(words: &[String], vocabulary: &[&str]) -> bool {
    words.iter().any(|w| vocabulary.contains(&w.as_str()))
}

fn has_stem(words: &[String], stems: &[&str]) -> bool {
    words.iter().any(|w| stems.iter().any(|s| w.starts_with(s)))
}

/// Resolves a language choice against the tenant's supported languages.
pub fn parse_language(input: &Input, config: &TenantConfig) -> Option<Language> {
    let code = match input {
        Input::Button(payload) => payload.strip_prefix(LANG_PREFIX)?.to_string(),
        Input::Text(text) => {
            let text = text.trim().to_lowercase();
            LANGUAGE_NAMES
                .iter()
                .find(|(_, names)| names.contains(&text.as_str()))
                .map(|(code, _)| code.to_string())
                .unwrap_or(text)
        }
        Input::Command(_) => return None,
    };
    config.supported_language(&code).cloned()
}

pub fn parse_goal(input: &Input) -> Option<Goal> {
    match input {
        Input::Button(payload) => payload.strip_prefix(GOAL_PREFIX)?.parse().ok(),
        Input::Text(text) => {
            let words = words(text);
            if has_stem(&words, &["invest", "roi", "yield", "income"]) {
                Some(Goal::Invest)
            } else if has_stem(&words, &["rent", "lease"]) {
                Some(Goal::Rent)
            } else if has_stem(&words, &["live", "living", "relocat", "move", "family", "home"]) {
                Some(Goal::Live)
            } else {
                None
            }
        }
        Input::Command(_) => None,
    }
}

static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(thousand|million|mln|mil|k|m)?\b")
        .expect("amount pattern is valid")
});

// Bare numbers below this are room counts or years, not prices.
const MIN_AMOUNT: u64 = 1_000;
// Budgets are stored as BIGINT.
const MAX_AMOUNT: u64 = i64::MAX as u64;

fn amounts(text: &str) -> Vec<u64> {
    AMOUNT
        .captures_iter(text)
        .filter_map(|caps| {
            let number: f64 = caps[1].replace(',', "").parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(unit) if unit == "k" || unit == "thousand" => 1_000.0,
                Some(_) => 1_000_000.0,
                None => 1.0,
            };
            let amount = (number * multiplier).round();
            (amount >= MIN_AMOUNT as f64).then(|| (amount as u64).min(MAX_AMOUNT))
        })
        .collect()
}

/// Parses a budget from a bracket button or free text.
///
/// Two amounts form a range. A single amount is an upper bound unless it is
/// introduced by a lower-bound phrase ("from", "over", "at least").
pub fn parse_budget(input: &Input) -> Option<BudgetRange> {
    match input {
        Input::Button(payload) => {
            let index: usize = payload.strip_prefix(BUDGET_PREFIX)?.parse().ok()?;
            BUDGET_BRACKETS.get(index).map(|b| BudgetRange {
                min: b.min,
                max: b.max,
            })
        }
        Input::Text(text) => {
            let found = amounts(text);
            match found.as_slice() {
                [] => None,
                [single] => {
                    let words = words(text);
                    let lower_bound = has_word(&words, &["from", "over", "above", "min", "minimum", "least", "от"])
                        || text.trim_end().ends_with('+');
                    if lower_bound {
                        Some(BudgetRange {
                            min: Some(*single),
                            max: None,
                        })
                    } else {
                        Some(BudgetRange {
                            min: None,
                            max: Some(*single),
                        })
                    }
                }
                [a, b, ..] => Some(BudgetRange {
                    min: Some(*a.min(b)),
                    max: Some(*a.max(b)),
                }),
            }
        }
        Input::Command(_) => None,
    }
}

pub fn parse_property_type(input: &Input) -> Option<PropertyType> {
    match input {
        Input::Button(payload) => payload.strip_prefix(PTYPE_PREFIX)?.parse().ok(),
        Input::Text(text) => {
            let words = words(text);
            // Most specific first: "penthouse apartment" is a penthouse.
            if has_stem(&words, &["penthouse"]) {
                Some(PropertyType::Penthouse)
            } else if has_stem(&words, &["townhouse", "townhome"]) || text.to_lowercase().contains("town house") {
                Some(PropertyType::Townhouse)
            } else if has_stem(&words, &["villa"]) {
                Some(PropertyType::Villa)
            } else if has_stem(&words, &["commercial", "office", "shop", "retail", "warehouse"]) {
                Some(PropertyType::Commercial)
            } else if has_stem(&words, &["apartment", "flat", "studio", "condo"]) {
                Some(PropertyType::Apartment)
            } else {
                None
            }
        }
        Input::Command(_) => None,
    }
}

pub fn parse_value_choice(input: &Input) -> Option<ValueChoice> {
    match input {
        Input::Button(payload) if payload == VP_MORE => Some(ValueChoice::More),
        Input::Button(payload) if payload == VP_INTERESTED => Some(ValueChoice::Interested),
        Input::Text(text) => {
            let words = words(text);
            if has_word(&words, &["more", "other", "another", "else"]) {
                Some(ValueChoice::More)
            } else if has_word(&words, &["yes", "interested", "sure", "ok", "okay", "great"]) {
                Some(ValueChoice::Interested)
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn parse_gate_choice(input: &Input) -> Option<GateChoice> {
    match input {
        Input::Button(payload) if payload == GATE_BOOK => Some(GateChoice::Book),
        Input::Button(payload) if payload == GATE_LATER => Some(GateChoice::Later),
        Input::Text(text) => {
            let words = words(text);
            if has_word(&words, &["later", "no", "not", "maybe"]) {
                Some(GateChoice::Later)
            } else if has_word(&words, &["book", "call", "yes", "meet", "meeting", "viewing"]) {
                Some(GateChoice::Book)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Resolves a booking slot by button index, 1-based number, or label.
///
/// A tenant without configured slots accepts any non-empty text as the
/// preferred time.
pub fn parse_slot(input: &Input, config: &TenantConfig) -> Option<String> {
    let slots = &config.booking_slots;
    match input {
        Input::Button(payload) => {
            let index: usize = payload.strip_prefix(SLOT_PREFIX)?.parse().ok()?;
            slots.get(index).cloned()
        }
        Input::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if slots.is_empty() {
                return Some(text.to_string());
            }
            if let Ok(n) = text.parse::<usize>() {
                return n.checked_sub(1).and_then(|i| slots.get(i)).cloned();
            }
            let lowered = text.to_lowercase();
            slots
                .iter()
                .find(|slot| slot.to_lowercase() == lowered)
                .or_else(|| slots.iter().find(|slot| lowered.contains(&slot.to_lowercase())))
                .cloned()
        }
        Input::Command(_) => None,
    }
}
