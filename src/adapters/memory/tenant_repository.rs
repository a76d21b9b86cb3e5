//! In-memory tenant repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenant::Tenant;
use crate::ports::TenantRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTenantRepository {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a tenant.
    pub async fn insert(&self, tenant: Tenant) {
        self.tenants.write().await.insert(tenant.id, tenant);
    }

    pub async fn set_active(&self, tenant_id: &TenantId, active: bool) -> Result<(), DomainError> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.get_mut(tenant_id).ok_or_else(|| not_found(tenant_id))?;
        tenant.active = active;
        Ok(())
    }
}

fn not_found(tenant_id: &TenantId) -> DomainError {
    DomainError::new(ErrorCode::TenantNotFound, format!("Tenant not found: {}", tenant_id))
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn get_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, DomainError> {
        self.tenants
            .read()
            .await
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| not_found(tenant_id))
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DomainError> {
        let mut active: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn set_admin_channel(
        &self,
        tenant_id: &TenantId,
        channel_id: &str,
    ) -> Result<Option<String>, DomainError> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.get_mut(tenant_id).ok_or_else(|| not_found(tenant_id))?;
        Ok(tenant.admin_channel_id.replace(channel_id.to_string()))
    }
}
