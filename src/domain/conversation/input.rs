//! Normalized inbound input.
//!
//! Channel adapters reduce every inbound update to one of three shapes before
//! it reaches the engine.

use serde::{Deserialize, Serialize};

/// What the prospect sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Input {
    /// Free text typed by the user.
    Text(String),
    /// Payload of a pressed quick-reply button.
    Button(String),
    /// A slash command without the slash (`"start"`).
    Command(String),
}

impl Input {
    pub fn text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    pub fn button(payload: impl Into<String>) -> Self {
        Input::Button(payload.into())
    }

    /// Builds a command, stripping a leading slash and any bot suffix (`/start@bot`).
    pub fn command(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim().trim_start_matches('/');
        let name = raw.split(['@', ' ']).next().unwrap_or_default();
        Input::Command(name.to_lowercase())
    }

    /// Free text, if this is a text input.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Input::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Button payload, if this is a button press.
    pub fn as_button(&self) -> Option<&str> {
        match self {
            Input::Button(payload) => Some(payload.as_str()),
            _ => None,
        }
    }

    pub fn is_command(&self, name: &str) -> bool {
        matches!(self, Input::Command(cmd) if cmd == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_strips_slash_and_bot_suffix() {
        assert_eq!(Input::command("/start@AcmeBot"), Input::Command("start".into()));
        assert_eq!(Input::command("/START now"), Input::Command("start".into()));
        assert!(Input::command("/start").is_command("start"));
    }

    #[test]
    fn accessors_are_variant_specific() {
        assert_eq!(Input::text("hi").as_text(), Some("hi"));
        assert_eq!(Input::text("hi").as_button(), None);
        assert_eq!(Input::button("lang_en").as_button(), Some("lang_en"));
    }

    #[test]
    fn serializes_as_tagged_union() {
        let json = serde_json::to_value(Input::button("goal_invest")).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["value"], "goal_invest");
    }
}
