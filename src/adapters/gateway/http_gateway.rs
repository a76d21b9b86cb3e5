//! Webhook messaging gateway.
//!
//! Posts every outbound message as JSON to a single channel-bridge endpoint,
//! which owns the actual chat platform credentials.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::domain::conversation::{Button, OutboundMessage};
use crate::domain::foundation::TenantId;
use crate::ports::{DeliveryError, MessagingGateway};

#[derive(Debug, Clone)]
pub struct HttpMessagingGateway {
    client: Client,
    webhook_url: String,
}

impl HttpMessagingGateway {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Permanent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct DeliveryPayload<'a> {
    tenant_id: String,
    recipient: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "no_buttons")]
    buttons: &'a [Button],
}

fn no_buttons(buttons: &&[Button]) -> bool {
    buttons.is_empty()
}

/// 5xx and 429 may succeed later; any other non-success status will not.
fn classify(status: StatusCode) -> Option<DeliveryError> {
    if status.is_success() {
        None
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Some(DeliveryError::Transient(format!("gateway returned {}", status)))
    } else {
        Some(DeliveryError::Permanent(format!("gateway returned {}", status)))
    }
}

#[async_trait]
impl MessagingGateway for HttpMessagingGateway {
    async fn send(
        &self,
        tenant_id: &TenantId,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        let payload = DeliveryPayload {
            tenant_id: tenant_id.to_string(),
            recipient,
            text: &message.text,
            buttons: &message.buttons,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    DeliveryError::Transient(e.to_string())
                } else {
                    DeliveryError::Permanent(e.to_string())
                }
            })?;

        match classify(response.status()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
