//! PostgreSQL implementation of LeadStore.
//!
//! Writes are field-scoped: only columns present in the patch appear in the
//! `SET` clause, and `version` is bumped on every write.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::foundation::{DomainError, ErrorCode, Language, LeadId, TenantId, Timestamp};
use crate::domain::lead::{GhostStage, Lead, LeadPatch, UrgencyScore};
use crate::ports::LeadStore;

use super::{column, database_error, optional_enum, parse_enum};

const LEAD_COLUMNS: &str = "id, tenant_id, external_ref, conversation_state, language, name, phone, \
     budget_min, budget_max, property_type, transaction_type, purpose, booking_slot, \
     ghost_stage, urgency_score, admin_alert_sent, created_at, updated_at, version";

#[derive(Clone)]
pub struct PostgresLeadStore {
    pool: PgPool,
}

impl PostgresLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, tenant_id: &TenantId, lead_id: &LeadId) -> Result<Option<Lead>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leads WHERE tenant_id = $1 AND id = $2",
            LEAD_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(lead_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("fetch lead"))?;

        row.map(row_to_lead).transpose()
    }
}

#[async_trait]
impl LeadStore for PostgresLeadStore {
    async fn get_lead(&self, tenant_id: &TenantId, lead_id: &LeadId) -> Result<Lead, DomainError> {
        self.fetch(tenant_id, lead_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::LeadNotFound, format!("Lead not found: {}", lead_id))
        })
    }

    async fn find_or_create_lead(
        &self,
        tenant_id: &TenantId,
        external_ref: &str,
        language: &Language,
    ) -> Result<Lead, DomainError> {
        let lead = Lead::new(*tenant_id, external_ref, language.clone(), Timestamp::now());

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO leads (
                id, tenant_id, external_ref, conversation_state, language,
                ghost_stage, urgency_score, admin_alert_sent, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8, $8, 0)
            ON CONFLICT (tenant_id, external_ref) DO NOTHING
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(lead.id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(external_ref)
        .bind(lead.conversation_state.as_str())
        .bind(language.as_str())
        .bind(lead.ghost_stage.as_str())
        .bind(lead.urgency_score.value() as i16)
        .bind(lead.created_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("insert lead"))?;

        if let Some(row) = inserted {
            return row_to_lead(row);
        }

        let row = sqlx::query(&format!(
            "SELECT {} FROM leads WHERE tenant_id = $1 AND external_ref = $2",
            LEAD_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(external_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("fetch lead by reference"))?;
        row_to_lead(row)
    }

    async fn update_lead_fields(
        &self,
        tenant_id: &TenantId,
        lead_id: &LeadId,
        patch: &LeadPatch,
        expected_version: Option<u64>,
    ) -> Result<Lead, DomainError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE leads SET version = version + 1");
        push_patch(&mut query, patch);
        query
            .push(" WHERE tenant_id = ")
            .push_bind(*tenant_id.as_uuid())
            .push(" AND id = ")
            .push_bind(*lead_id.as_uuid());
        if let Some(version) = expected_version {
            query.push(" AND version = ").push_bind(version as i64);
        }
        query.push(" RETURNING ").push(LEAD_COLUMNS);

        let row = query
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error("update lead"))?;

        match row {
            Some(row) => row_to_lead(row),
            None => match self.fetch(tenant_id, lead_id).await? {
                Some(current) => Err(DomainError::new(
                    ErrorCode::VersionConflict,
                    format!("Lead {} changed concurrently", lead_id),
                )
                .with_detail("actual", current.version.to_string())),
                None => Err(DomainError::new(
                    ErrorCode::LeadNotFound,
                    format!("Lead not found: {}", lead_id),
                )),
            },
        }
    }

    async fn query_inactive_leads(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
        stages: &[GhostStage],
    ) -> Result<Vec<Lead>, DomainError> {
        let stages: Vec<&str> = stages.iter().map(GhostStage::as_str).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM leads
            WHERE tenant_id = $1
              AND phone IS NOT NULL
              AND conversation_state <> 'booked'
              AND updated_at <= $2
              AND ghost_stage = ANY($3)
            ORDER BY updated_at ASC
            "#,
            LEAD_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(since.as_datetime())
        .bind(&stages[..])
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("query inactive leads"))?;

        rows.into_iter().map(row_to_lead).collect()
    }

    async fn leads_touched_since(
        &self,
        tenant_id: &TenantId,
        since: Timestamp,
    ) -> Result<Vec<Lead>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM leads WHERE tenant_id = $1 AND updated_at >= $2 ORDER BY created_at ASC",
            LEAD_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(since.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("query touched leads"))?;

        rows.into_iter().map(row_to_lead).collect()
    }
}

/// BIGINT holds up to `i64::MAX`; larger amounts saturate.
fn amount_column(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Appends `, column = $n` for every field the patch carries.
fn push_patch(query: &mut QueryBuilder<'_, Postgres>, patch: &LeadPatch) {
    if let Some(state) = patch.conversation_state {
        query.push(", conversation_state = ").push_bind(state.as_str());
    }
    if let Some(ref language) = patch.language {
        query.push(", language = ").push_bind(language.as_str().to_string());
    }
    if let Some(ref name) = patch.name {
        query.push(", name = ").push_bind(name.clone());
    }
    if let Some(ref phone) = patch.phone {
        query.push(", phone = ").push_bind(phone.clone());
    }
    if let Some(range) = patch.budget {
        query.push(", budget_min = ").push_bind(range.min.map(amount_column));
        query.push(", budget_max = ").push_bind(range.max.map(amount_column));
    }
    if let Some(kind) = patch.property_type {
        query.push(", property_type = ").push_bind(kind.as_str());
    }
    if let Some(tx) = patch.transaction_type {
        query.push(", transaction_type = ").push_bind(tx.as_str());
    }
    if let Some(purpose) = patch.purpose {
        query.push(", purpose = ").push_bind(purpose.as_str());
    }
    if let Some(ref slot) = patch.booking_slot {
        query.push(", booking_slot = ").push_bind(slot.clone());
    }
    if let Some(score) = patch.urgency_score {
        query.push(", urgency_score = ").push_bind(score.value() as i16);
    }
    if let Some(stage) = patch.ghost_stage {
        query.push(", ghost_stage = ").push_bind(stage.as_str());
    }
    // sticky: never written back to false
    if patch.admin_alert_sent == Some(true) {
        query.push(", admin_alert_sent = TRUE");
    }
    if let Some(at) = patch.updated_at {
        query.push(", updated_at = ").push_bind(*at.as_datetime());
    }
}

fn row_to_lead(row: PgRow) -> Result<Lead, DomainError> {
    let language: Option<String> = column(&row, "language")?;
    let language = language
        .map(Language::new)
        .transpose()
        .map_err(|e| DomainError::database(format!("Invalid language: {}", e)))?;

    let urgency: i16 = column(&row, "urgency_score")?;
    let urgency = UrgencyScore::new(urgency.clamp(0, u8::MAX as i16) as u8)
        .map_err(|e| DomainError::database(format!("Invalid urgency score: {}", e)))?;

    let budget_min: Option<i64> = column(&row, "budget_min")?;
    let budget_max: Option<i64> = column(&row, "budget_max")?;
    let version: i64 = column(&row, "version")?;

    Ok(Lead {
        id: LeadId::from_uuid(column(&row, "id")?),
        tenant_id: TenantId::from_uuid(column(&row, "tenant_id")?),
        external_ref: column(&row, "external_ref")?,
        conversation_state: parse_enum(&row, "conversation_state")?,
        language,
        name: column(&row, "name")?,
        phone: column(&row, "phone")?,
        budget_min: budget_min.map(|v| v.max(0) as u64),
        budget_max: budget_max.map(|v| v.max(0) as u64),
        property_type: optional_enum(&row, "property_type")?,
        transaction_type: optional_enum(&row, "transaction_type")?,
        purpose: optional_enum(&row, "purpose")?,
        booking_slot: column(&row, "booking_slot")?,
        ghost_stage: parse_enum(&row, "ghost_stage")?,
        urgency_score: urgency,
        admin_alert_sent: column(&row, "admin_alert_sent")?,
        created_at: Timestamp::from_datetime(column(&row, "created_at")?),
        updated_at: Timestamp::from_datetime(column(&row, "updated_at")?),
        version: version.max(0) as u64,
    })
}
