//! RegisterAdminHandler - binds a tenant's admin channel.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::TenantRepository;

#[derive(Debug, Clone)]
pub struct RegisterAdminCommand {
    pub tenant_id: TenantId,
    pub channel_id: String,
}

/// Acknowledgement of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRegistered {
    pub tenant_id: TenantId,
    pub channel_id: String,
    /// Channel that was registered before, if any.
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum RegisterAdminError {
    #[error("Validation error: channel id cannot be empty")]
    EmptyChannel,

    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<DomainError> for RegisterAdminError {
    fn from(err: DomainError) -> Self {
        RegisterAdminError::Repository(err.to_string())
    }
}

/// Handler for admin registration.
pub struct RegisterAdminHandler {
    tenants: Arc<dyn TenantRepository>,
}

impl RegisterAdminHandler {
    pub fn new(tenants: Arc<dyn TenantRepository>) -> Self {
        Self { tenants }
    }

    pub async fn handle(&self, cmd: RegisterAdminCommand) -> Result<AdminRegistered, RegisterAdminError> {
        let channel_id = cmd.channel_id.trim();
        if channel_id.is_empty() {
            return Err(RegisterAdminError::EmptyChannel);
        }

        let replaced = self
            .tenants
            .set_admin_channel(&cmd.tenant_id, channel_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RegisterAdminError::TenantNotFound(cmd.tenant_id)
                } else {
                    RegisterAdminError::from(e)
                }
            })?;

        info!(tenant_id = %cmd.tenant_id, replaced = replaced.is_some(), "admin channel registered");

        Ok(AdminRegistered {
            tenant_id: cmd.tenant_id,
            channel_id: channel_id.to_string(),
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryTenantRepository;
    use crate::domain::foundation::Language;
    use crate::domain::tenant::{Tenant, TenantConfig};

    async fn setup() -> (RegisterAdminHandler, Arc<InMemoryTenantRepository>, TenantId) {
        let repo = Arc::new(InMemoryTenantRepository::new());
        let tenant = Tenant::new("Acme", TenantConfig::new("Acme Realty", Language::english()));
        let id = tenant.id;
        repo.insert(tenant).await;
        (RegisterAdminHandler::new(repo.clone()), repo, id)
    }

    #[tokio::test]
    async fn registers_and_reports_replacement() {
        let (handler, repo, id) = setup().await;

        let first = handler
            .handle(RegisterAdminCommand { tenant_id: id, channel_id: " admin-1 ".into() })
            .await
            .unwrap();
        assert_eq!(first.channel_id, "admin-1");
        assert_eq!(first.replaced, None);

        let second = handler
            .handle(RegisterAdminCommand { tenant_id: id, channel_id: "admin-2".into() })
            .await
            .unwrap();
        assert_eq!(second.replaced.as_deref(), Some("admin-1"));
        assert_eq!(repo.get_tenant(&id).await.unwrap().admin_channel(), Some("admin-2"));
    }

    #[tokio::test]
    async fn rejects_empty_channel() {
        let (handler, _, id) = setup().await;
        let err = handler
            .handle(RegisterAdminCommand { tenant_id: id, channel_id: "  ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterAdminError::EmptyChannel));
    }

    #[tokio::test]
    async fn unknown_tenant() {
        let (handler, _, _) = setup().await;
        let err = handler
            .handle(RegisterAdminCommand { tenant_id: TenantId::new(), channel_id: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterAdminError::TenantNotFound(_)));
    }
}
