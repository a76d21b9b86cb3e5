//! Hot-lead alerts and other admin-channel deliveries.
//!
//! Fired synchronously after a successful contact capture. Delivery failures
//! are logged and never roll back the conversation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::conversation::{templates, OutboundMessage};
use crate::domain::lead::{Lead, LeadPatch};
use crate::domain::tenant::Tenant;
use crate::ports::{DeliveryError, LeadStore, MessagingGateway};

/// Why nothing was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tenant never registered an admin channel.
    NoAdminChannel,
    /// This lead was already announced.
    AlreadySent,
}

/// Result of one admin delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Skipped(SkipReason),
    Delivered { attempts: u8 },
    Failed { attempts: u8, error: DeliveryError },
}

impl AlertOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, AlertOutcome::Delivered { .. })
    }

    /// Gateway calls made.
    pub fn attempts(&self) -> u8 {
        match self {
            AlertOutcome::Skipped(_) => 0,
            AlertOutcome::Delivered { attempts } | AlertOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Configuration for [`AlertDispatcher`].
#[derive(Debug, Clone)]
pub struct AlertSettings {
    /// Pause before the single retry of a transient failure.
    pub retry_delay: Duration,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Delivers messages to a tenant's admin channel.
pub struct AlertDispatcher {
    gateway: Arc<dyn MessagingGateway>,
    leads: Arc<dyn LeadStore>,
    settings: AlertSettings,
}

impl AlertDispatcher {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        leads: Arc<dyn LeadStore>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            gateway,
            leads,
            settings,
        }
    }

    /// Announces a freshly captured lead to the tenant's admin channel.
    ///
    /// At most one alert per lead: `admin_alert_sent` is written after any
    /// attempt, whether it succeeded or not.
    pub async fn dispatch(&self, tenant: &Tenant, lead: &Lead) -> AlertOutcome {
        if tenant.admin_channel().is_none() {
            info!(
                tenant_id = %tenant.id,
                lead_id = %lead.id,
                "no admin channel registered, hot-lead alert skipped"
            );
            return AlertOutcome::Skipped(SkipReason::NoAdminChannel);
        }
        if lead.admin_alert_sent {
            return AlertOutcome::Skipped(SkipReason::AlreadySent);
        }

        let message = OutboundMessage::text(templates::hot_lead_alert(lead));
        let outcome = self.send_to_admin(tenant, &message).await;

        if let Err(e) = self
            .leads
            .update_lead_fields(&tenant.id, &lead.id, &LeadPatch::alert_sent(), None)
            .await
        {
            error!(
                tenant_id = %tenant.id,
                lead_id = %lead.id,
                error = %e,
                "failed to record admin alert"
            );
        }
        outcome
    }

    /// Sends `message` to the admin channel with one retry on a transient failure.
    pub async fn send_to_admin(&self, tenant: &Tenant, message: &OutboundMessage) -> AlertOutcome {
        let Some(channel) = tenant.admin_channel() else {
            info!(tenant_id = %tenant.id, "no admin channel registered, delivery skipped");
            return AlertOutcome::Skipped(SkipReason::NoAdminChannel);
        };

        match self.gateway.send(&tenant.id, channel, message).await {
            Ok(()) => AlertOutcome::Delivered { attempts: 1 },
            Err(e) if e.is_transient() => {
                warn!(tenant_id = %tenant.id, error = %e, "admin delivery failed, retrying once");
                tokio::time::sleep(self.settings.retry_delay).await;
                match self.gateway.send(&tenant.id, channel, message).await {
                    Ok(()) => AlertOutcome::Delivered { attempts: 2 },
                    Err(e) => {
                        error!(tenant_id = %tenant.id, error = %e, "admin delivery failed after retry");
                        AlertOutcome::Failed { attempts: 2, error: e }
                    }
                }
            }
            Err(e) => {
                error!(tenant_id = %tenant.id, error = %e, "admin delivery rejected");
                AlertOutcome::Failed { attempts: 1, error: e }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLeadStore, RecordingGateway};
    use crate::domain::foundation::Language;
    use crate::domain::tenant::TenantConfig;

    fn tenant(admin: Option<&str>) -> Tenant {
        let tenant = Tenant::new("Acme", TenantConfig::new("Acme Realty", Language::english()));
        match admin {
            Some(channel) => tenant.with_admin_channel(channel),
            None => tenant,
        }
    }

    async fn captured_lead(store: &InMemoryLeadStore, tenant: &Tenant) -> Lead {
        let lead = store
            .find_or_create_lead(&tenant.id, "chat-1", &Language::english())
            .await
            .unwrap();
        let patch = LeadPatch {
            name: Some("John Doe".into()),
            phone: Some("+971501234567".into()),
            ..LeadPatch::default()
        };
        store.update_lead_fields(&tenant.id, &lead.id, &patch, None).await.unwrap()
    }

    fn dispatcher(gateway: &Arc<RecordingGateway>, store: &Arc<InMemoryLeadStore>) -> AlertDispatcher {
        AlertDispatcher::new(
            gateway.clone(),
            store.clone(),
            AlertSettings {
                retry_delay: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn delivers_and_records_flag() {
        let gateway = Arc::new(RecordingGateway::new());
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(Some("admin-chat"));
        let lead = captured_lead(&store, &tenant).await;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;

        assert_eq!(outcome, AlertOutcome::Delivered { attempts: 1 });
        let sent = gateway.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "admin-chat");
        assert!(sent[0].message.text.contains("+971501234567"));
        assert!(store.get_lead(&tenant.id, &lead.id).await.unwrap().admin_alert_sent);
    }

    #[tokio::test]
    async fn no_admin_channel_means_zero_gateway_calls() {
        let gateway = Arc::new(RecordingGateway::new());
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(None);
        let lead = captured_lead(&store, &tenant).await;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;

        assert_eq!(outcome, AlertOutcome::Skipped(SkipReason::NoAdminChannel));
        assert_eq!(gateway.attempts(), 0);
        assert!(!store.get_lead(&tenant.id, &lead.id).await.unwrap().admin_alert_sent);
    }

    #[tokio::test]
    async fn already_sent_is_skipped() {
        let gateway = Arc::new(RecordingGateway::new());
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(Some("admin-chat"));
        let mut lead = captured_lead(&store, &tenant).await;
        lead.admin_alert_sent = true;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;
        assert_eq!(outcome, AlertOutcome::Skipped(SkipReason::AlreadySent));
        assert_eq!(gateway.attempts(), 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.fail_next(DeliveryError::Transient("timeout".into())).await;
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(Some("admin-chat"));
        let lead = captured_lead(&store, &tenant).await;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;
        assert_eq!(outcome, AlertOutcome::Delivered { attempts: 2 });
    }

    #[tokio::test]
    async fn exhausted_retry_still_marks_sent() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.fail_next(DeliveryError::Transient("timeout".into())).await;
        gateway.fail_next(DeliveryError::Transient("timeout".into())).await;
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(Some("admin-chat"));
        let lead = captured_lead(&store, &tenant).await;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;
        assert_eq!(outcome.attempts(), 2);
        assert!(!outcome.is_delivered());
        assert!(store.get_lead(&tenant.id, &lead.id).await.unwrap().admin_alert_sent);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.fail_next(DeliveryError::Permanent("bot blocked".into())).await;
        let store = Arc::new(InMemoryLeadStore::new());
        let tenant = tenant(Some("admin-chat"));
        let lead = captured_lead(&store, &tenant).await;

        let outcome = dispatcher(&gateway, &store).dispatch(&tenant, &lead).await;
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(gateway.attempts(), 1);
    }
}
