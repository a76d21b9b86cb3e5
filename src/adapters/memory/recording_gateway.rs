//! Messaging gateway that records deliveries instead of sending them.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::domain::conversation::OutboundMessage;
use crate::domain::foundation::TenantId;
use crate::ports::{DeliveryError, MessagingGateway};

/// One successful delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub tenant_id: TenantId,
    pub recipient: String,
    pub message: OutboundMessage,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failures: Arc<Mutex<VecDeque<DeliveryError>>>,
    attempts: Arc<AtomicUsize>,
    delay: Duration,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every send, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the next send fail with `error`. Calls queue up.
    pub async fn fail_next(&self, error: DeliveryError) {
        self.failures.lock().await.push_back(error);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> Vec<SentMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient == recipient)
            .cloned()
            .collect()
    }

    /// Number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send(
        &self,
        tenant_id: &TenantId,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }
        self.sent.lock().await.push(SentMessage {
            tenant_id: *tenant_id,
            recipient: recipient.to_string(),
            message: message.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_injects_failures() {
        let gateway = RecordingGateway::new();
        let tenant = TenantId::new();
        gateway.fail_next(DeliveryError::Permanent("blocked".into())).await;

        let msg = OutboundMessage::text("hi");
        assert!(gateway.send(&tenant, "chat-1", &msg).await.is_err());
        assert!(gateway.send(&tenant, "chat-1", &msg).await.is_ok());

        assert_eq!(gateway.attempts(), 2);
        assert_eq!(gateway.sent_to("chat-1").await.len(), 1);
        assert!(gateway.sent_to("chat-2").await.is_empty());
    }
}
