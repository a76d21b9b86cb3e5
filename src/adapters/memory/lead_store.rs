//! In-memory lead store.
//!
//! Useful for testing and single-node runs. Enforces the same tenant scoping,
//! optimistic versions and sticky alert flag as the PostgreSQL adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Language, LeadId, TenantId, Timestamp};
use crate::domain::lead::{GhostStage, Lead, LeadPatch};
use crate::ports::LeadStore;

#[derive(Debug, Default)]
struct Inner {
    leads: HashMap<LeadId, Lead>,
    by_ref: HashMap<(TenantId, String), LeadId>,
}

/// In-memory storage for leads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeadStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a lead as-is (useful for tests that need a
    /// specific `updated_at` or stage).
    pub async fn insert(&self, lead: Lead) {
        let mut inner = self.inner.write().await;
        inner
            .by_ref
            .insert((lead.tenant_id, lead.external_ref.clone()), lead.id);
        inner.leads.insert(lead.id, lead);
    }

    pub async fn lead_count(&self) -> usize {
        self.inner.read().await.leads.len()
    }
}

fn not_found(lead_id: &LeadId) -> DomainError {
    DomainError::new(ErrorCode::LeadNotFound, format!("Lead not found: {}", lead_id))
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn get_lead(&self, tenant_id: &TenantId, lead_id: &LeadId) -> Result<Lead, DomainError> {
        let inner = self.inner.read().await;
        inner
            .leads
            .get(lead_id)
            .filter(|lead| lead.tenant_id == *tenant_id)
            .cloned()
            .ok_or_else(|| not_found(lead_id))
    }

    async fn find_or_create_lead(
        &self,
        tenant_id: &TenantId,
        external_ref: &str,
        language: &Language,
    ) -> Result<Lead, DomainError> {
        let mut inner = self.inner.write().await;
        let key = (*tenant_id, external_ref.to_string());
        if let Some(lead) = inner.by_ref.get(&key).and_then(|id| inner.leads.get(id)) {
            return Ok(lead.clone());
        }

        let lead = Lead::new(*tenant_id, external_ref, language.clone(), Timestamp::now());
        inner.by_ref.insert(key, lead.id);
        inner.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn update_lead_fields(
        &self,
        tenant_id: &TenantId,
        lead_id: &LeadId,
        patch: &LeadPatch,
        expected_version: Option<u64>,
    ) -> Result<Lead, DomainError> {
        let mut inner = self.inner.write().await;
        let lead = inner
            .leads
            .get_mut(lead_id)
            .filter(|lead| lead.tenant_id == *tenant_id)
            .ok_or_else(|| not_found(lead_id))?;

        if let Some(expected) = expected_version {
            if lead.version != expected {
                return Err(DomainError::new(
                    ErrorCode::VersionConflict,
                    format!("Lead {} changed concurrently", lead_id),
                )
                .with_detail("expected", expected.to_string())
                .with_detail("actual", lead.version.to_string()));
            }
        }

        lead.apply(patch);
        Ok(lead.clone())
    }

    async fn query_inactive_leads(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
        stages: &[GhostStage],
    ) -> Result<Vec<Lead>, DomainError> {
        let inner = self.inner.read().await;
        let mut leads: Vec<Lead> = inner
            .leads
            .values()
            .filter(|lead| {
                lead.tenant_id == *tenant_id
                    && lead.has_contact()
                    && !lead.conversation_state.is_booked()
                    && lead.updated_at <= since
                    && stages.contains(&lead.ghost_stage)
            })
            .cloned()
            .collect();
        leads.sort_by_key(|lead| lead.updated_at);
        Ok(leads)
    }

    async fn leads_touched_since(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
    ) -> Result<Vec<Lead>, DomainError> {
        let inner = self.inner.read().await;
        let mut leads: Vec<Lead> = inner
            .leads
            .values()
            .filter(|lead| lead.tenant_id == *tenant_id && lead.updated_at >= since)
            .cloned()
            .collect();
        leads.sort_by_key(|lead| lead.created_at);
        Ok(leads)
    }
}
