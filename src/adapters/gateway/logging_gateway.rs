//! Gateway that only logs deliveries, for local runs without a webhook.

use async_trait::async_trait;
use tracing::info;

use crate::domain::conversation::OutboundMessage;
use crate::domain::foundation::TenantId;
use crate::ports::{DeliveryError, MessagingGateway};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingGateway;

#[async_trait]
impl MessagingGateway for LoggingGateway {
    async fn send(
        &self,
        tenant_id: &TenantId,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        info!(
            tenant_id = %tenant_id,
            recipient,
            buttons = message.buttons.len(),
            text = %message.text,
            "outbound message (not delivered)"
        );
        Ok(())
    }
}
