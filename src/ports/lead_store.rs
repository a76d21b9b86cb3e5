//! Lead store port.
//!
//! Persists leads with field-scoped writes. Every operation is keyed by the
//! tenant id as well as the lead id; a lead is invisible through any other
//! tenant.
//!
//! # Concurrency
//!
//! - `update_lead_fields` writes only the fields present in the patch
//! - When `expected_version` is given the write fails with
//!   `ErrorCode::VersionConflict` unless the stored version matches
//! - `updated_at` changes only when the patch carries it

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Language, LeadId, TenantId, Timestamp};
use crate::domain::lead::{GhostStage, Lead, LeadPatch};

/// Repository port for lead persistence.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fetch a lead by id within a tenant.
    ///
    /// # Errors
    ///
    /// - `LeadNotFound` if no such lead exists for this tenant
    /// - `DatabaseError` on persistence failure
    async fn get_lead(&self, tenant_id: &TenantId, lead_id: &LeadId) -> Result<Lead, DomainError>;

    /// Fetch the lead for a channel address, creating it on first contact.
    ///
    /// New leads start in the initial conversation state with `language`.
    async fn find_or_create_lead(
        &self,
        tenant_id: &TenantId,
        external_ref: &str,
        language: &Language,
    ) -> Result<Lead, DomainError>;

    /// Merge `patch` into the stored lead and return the result.
    ///
    /// # Errors
    ///
    /// - `LeadNotFound` if no such lead exists for this tenant
    /// - `VersionConflict` if `expected_version` is stale
    /// - `DatabaseError` on persistence failure
    async fn update_lead_fields(
        &self,
        tenant_id: &TenantId,
        lead_id: &LeadId,
        patch: &LeadPatch,
        expected_version: Option<u64>,
    ) -> Result<Lead, DomainError>;

    /// Leads with a captured phone, not booked, last active at or before
    /// `since`, whose ghost stage is one of `stages`.
    async fn query_inactive_leads(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
        stages: &[GhostStage],
    ) -> Result<Vec<Lead>, DomainError>;

    /// Leads whose last activity is at or after `since`.
    async fn leads_touched_since(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
    ) -> Result<Vec<Lead>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LeadStore) {}
    }
}
