//! Starting and stopping a tenant's bot.
//!
//! A running bot owns one supervised engagement scheduler. Inbound messages
//! are answered regardless; only follow-up nudges depend on the bot running.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::engagement::EngagementSupervisor;
use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::TenantRepository;

/// Bot state after a control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotStatus {
    pub tenant_id: TenantId,
    pub running: bool,
    /// False when the command found the bot already in the requested state.
    pub changed: bool,
}

#[derive(Debug, Clone, Error)]
pub enum BotControlError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Tenant is not active: {0}")]
    TenantInactive(TenantId),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<DomainError> for BotControlError {
    fn from(err: DomainError) -> Self {
        BotControlError::Repository(err.to_string())
    }
}

pub struct BotControlHandler {
    tenants: Arc<dyn TenantRepository>,
    supervisor: Arc<EngagementSupervisor>,
}

impl BotControlHandler {
    pub fn new(tenants: Arc<dyn TenantRepository>, supervisor: Arc<EngagementSupervisor>) -> Self {
        Self { tenants, supervisor }
    }

    pub async fn start(&self, tenant_id: TenantId) -> Result<BotStatus, BotControlError> {
        let tenant = self.tenants.get_tenant(&tenant_id).await.map_err(|e| {
            if e.is_not_found() {
                BotControlError::TenantNotFound(tenant_id)
            } else {
                BotControlError::from(e)
            }
        })?;
        if !tenant.active {
            return Err(BotControlError::TenantInactive(tenant_id));
        }

        let changed = self.supervisor.start_tenant(tenant_id).await;
        info!(tenant_id = %tenant_id, changed, "bot start requested");
        Ok(BotStatus {
            tenant_id,
            running: true,
            changed,
        })
    }

    /// Stops the bot. Waits for an in-flight nudge to finish.
    pub async fn stop(&self, tenant_id: TenantId) -> Result<BotStatus, BotControlError> {
        let changed = self.supervisor.stop_tenant(tenant_id).await;
        info!(tenant_id = %tenant_id, changed, "bot stop requested");
        Ok(BotStatus {
            tenant_id,
            running: false,
            changed,
        })
    }

    pub async fn status(&self, tenant_id: TenantId) -> BotStatus {
        BotStatus {
            tenant_id,
            running: self.supervisor.running_tenants().await.contains(&tenant_id),
            changed: false,
        }
    }
}
