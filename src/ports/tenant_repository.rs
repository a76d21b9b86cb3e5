//! Tenant repository port.
//!
//! Read access to tenant configuration and knowledge snapshots, plus the one
//! write this core performs: admin channel registration.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::tenant::Tenant;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Fetch a tenant with its configuration and knowledge snapshot.
    ///
    /// # Errors
    ///
    /// - `TenantNotFound` if the tenant does not exist
    async fn get_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, DomainError>;

    /// Tenants whose bots are running.
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DomainError>;

    /// Set the admin channel, returning the previous one.
    async fn set_admin_channel(
        &self,
        tenant_id: &TenantId,
        channel_id: &str,
    ) -> Result<Option<String>, DomainError>;
}
