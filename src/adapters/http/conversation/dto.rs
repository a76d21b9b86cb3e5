//! HTTP DTOs for the inbound message endpoint.

use serde::{Deserialize, Serialize};

use crate::application::{AlertOutcome, HandleMessageResult};
use crate::domain::conversation::{Button, Input, Outcome};
use crate::domain::lead::ConversationState;

/// Inbound prospect message, already normalized by the channel bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessageRequest {
    /// Channel address of the prospect (chat id).
    pub lead_ref: String,
    #[serde(flatten)]
    pub input: Input,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub lead_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    pub state: ConversationState,
    pub outcome: Outcome,
    pub committed: bool,
    pub reply_delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

fn describe(outcome: &AlertOutcome) -> String {
    match outcome {
        AlertOutcome::Skipped(reason) => format!("skipped: {:?}", reason),
        AlertOutcome::Delivered { attempts } => format!("delivered after {} attempt(s)", attempts),
        AlertOutcome::Failed { attempts, error } => {
            format!("failed after {} attempt(s): {}", attempts, error)
        }
    }
}

impl From<HandleMessageResult> for MessageResponse {
    fn from(result: HandleMessageResult) -> Self {
        Self {
            lead_id: result.lead_id.to_string(),
            text: result.response.text,
            buttons: result.response.buttons,
            state: result.response.next_state,
            outcome: result.response.outcome,
            committed: result.committed,
            reply_delivered: result.reply_delivered,
            alert: result.alert.as_ref().map(describe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_request_deserializes() {
        let json = r#"{"lead_ref": "chat-42", "type": "text", "value": "hello"}"#;
        let req: InboundMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.lead_ref, "chat-42");
        assert_eq!(req.input, Input::text("hello"));
    }

    #[test]
    fn button_request_deserializes() {
        let json = r#"{"lead_ref": "chat-42", "type": "button", "value": "lang_en"}"#;
        let req: InboundMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.input, Input::button("lang_en"));
    }

    #[test]
    fn missing_type_is_rejected() {
        let json = r#"{"lead_ref": "chat-42", "value": "hello"}"#;
        assert!(serde_json::from_str::<InboundMessageRequest>(json).is_err());
    }
}
