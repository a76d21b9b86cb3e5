//! Engine output: the reply, the state to move to, field updates and intents.

use serde::{Deserialize, Serialize};

use crate::domain::lead::{ConversationState, LeadPatch};

use super::{Button, OutboundMessage};

/// Identifies which structured prompt a response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Welcome,
    ChooseGoal,
    AskContact,
    ContactInvalid,
    AskBudget,
    AskPropertyType,
    ValueProposition,
    HardGate,
    GateDeferred,
    ChooseSlot,
    Booked,
    Reprompt,
    /// Generic apology when a step could not be completed.
    RetryLater,
}

/// How a response was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The input matched the current step's grammar.
    Structured { message_key: MessageKey },
    /// The input was answered by the completion service.
    Fallback { knowledge_hits: usize },
}

/// A side effect the caller performs after committing the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum Intent {
    SendMessage(OutboundMessage),
    /// Hand the lead to the agency's admin channel.
    NotifyAdmin,
    Noop,
}

/// Result of one engine step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub outcome: Outcome,
    pub text: String,
    pub buttons: Vec<Button>,
    pub next_state: ConversationState,
    pub field_updates: LeadPatch,
    pub intents: Vec<Intent>,
}

impl Response {
    pub fn structured(
        message_key: MessageKey,
        text: impl Into<String>,
        buttons: Vec<Button>,
        next_state: ConversationState,
    ) -> Self {
        Self::build(
            Outcome::Structured { message_key },
            text.into(),
            buttons,
            next_state,
        )
    }

    pub fn fallback(
        knowledge_hits: usize,
        text: impl Into<String>,
        buttons: Vec<Button>,
        next_state: ConversationState,
    ) -> Self {
        Self::build(
            Outcome::Fallback { knowledge_hits },
            text.into(),
            buttons,
            next_state,
        )
    }

    fn build(
        outcome: Outcome,
        text: String,
        buttons: Vec<Button>,
        next_state: ConversationState,
    ) -> Self {
        let reply = OutboundMessage::text(text.clone()).with_buttons(buttons.clone());
        Self {
            outcome,
            text,
            buttons,
            next_state,
            field_updates: LeadPatch::default(),
            intents: vec![Intent::SendMessage(reply)],
        }
    }

    pub fn with_updates(mut self, updates: LeadPatch) -> Self {
        self.field_updates = self.field_updates.merge(updates);
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        if intent != Intent::Noop {
            self.intents.push(intent);
        }
        self
    }

    /// The structured prompt key, if the response was not a fallback.
    pub fn message_key(&self) -> Option<MessageKey> {
        match self.outcome {
            Outcome::Structured { message_key } => Some(message_key),
            Outcome::Fallback { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback { .. })
    }

    pub fn requests_admin_alert(&self) -> bool {
        self.intents.contains(&Intent::NotifyAdmin)
    }

    /// The reply message carried by the `SendMessage` intent.
    pub fn reply(&self) -> Option<&OutboundMessage> {
        self.intents.iter().find_map(|intent| match intent {
            Intent::SendMessage(message) => Some(message),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_response_carries_exactly_one_send() {
        let response = Response::structured(
            MessageKey::Welcome,
            "hello",
            vec![Button::new("English", "lang_en")],
            ConversationState::LanguageSelect,
        )
        .with_intent(Intent::NotifyAdmin)
        .with_intent(Intent::Noop);

        let sends = response
            .intents
            .iter()
            .filter(|i| matches!(i, Intent::SendMessage(_)))
            .count();
        assert_eq!(sends, 1);
        assert!(response.requests_admin_alert());
        assert!(!response.intents.contains(&Intent::Noop));
        assert_eq!(response.reply().map(|m| m.buttons.len()), Some(1));
    }

    #[test]
    fn fallback_has_no_message_key() {
        let response = Response::fallback(2, "answer", vec![], ConversationState::Booked);
        assert!(response.is_fallback());
        assert_eq!(response.message_key(), None);
    }

    #[test]
    fn updates_merge() {
        let response = Response::structured(
            MessageKey::AskBudget,
            "budget?",
            vec![],
            ConversationState::Budget,
        )
        .with_updates(LeadPatch {
            name: Some("Ann".into()),
            ..Default::default()
        })
        .with_updates(LeadPatch {
            phone: Some("+971501234567".into()),
            ..Default::default()
        });

        assert_eq!(response.field_updates.name.as_deref(), Some("Ann"));
        assert_eq!(response.field_updates.phone.as_deref(), Some("+971501234567"));
    }
}
