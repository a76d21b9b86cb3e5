//! Outbound message value objects.

use serde::{Deserialize, Serialize};

/// A quick-reply button offered with a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Label shown to the user.
    pub label: String,
    /// Payload echoed back as [`Input::Button`](super::Input::Button) when pressed.
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A channel-neutral outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buttons_are_omitted_from_json() {
        let json = serde_json::to_value(OutboundMessage::text("hi")).unwrap();
        assert!(json.get("buttons").is_none());
    }

    #[test]
    fn buttons_deserialize_when_absent() {
        let msg: OutboundMessage = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(msg.buttons.is_empty());
    }
}
