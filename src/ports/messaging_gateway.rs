//! Messaging gateway port (outbound).
//!
//! Delivers normalized outbound messages to a channel recipient (a prospect's
//! chat or a tenant's admin channel). Channel-specific wire formats live
//! behind the implementation.

use async_trait::async_trait;

use crate::domain::conversation::OutboundMessage;
use crate::domain::foundation::TenantId;

/// Delivery failures, split by whether a retry can help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Timeouts, connection resets, 5xx: worth retrying.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// Blocked bot, unknown recipient, rejected payload: retrying will not help.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::Transient(_))
    }
}

/// Port for sending messages through a tenant's channel.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Sends one message to `recipient` on behalf of `tenant_id`.
    async fn send(
        &self,
        tenant_id: &TenantId,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_distinguished_from_permanent() {
        assert!(DeliveryError::Transient("timeout".into()).is_transient());
        assert!(!DeliveryError::Permanent("blocked".into()).is_transient());
    }

    #[test]
    fn messaging_gateway_is_object_safe() {
        fn _accepts_dyn(_gw: &dyn MessagingGateway) {}
    }
}
