//! PostgreSQL implementation of TenantRepository.
//!
//! A tenant row carries the bot configuration; its knowledge base lives in
//! `knowledge_entries`, ordered by `position`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Language, TenantId};
use crate::domain::tenant::{KnowledgeEntry, Tenant, TenantConfig};
use crate::ports::TenantRepository;

use super::{column, database_error};

const TENANT_COLUMNS: &str = "id, name, admin_channel_id, active, agency_name, default_language, \
     supported_languages, booking_slots";

#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn knowledge_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<KnowledgeEntry>>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, title, content, keywords, language, priority, category
            FROM knowledge_entries
            WHERE tenant_id = ANY($1)
            ORDER BY tenant_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("fetch knowledge entries"))?;

        let mut by_tenant: HashMap<Uuid, Vec<KnowledgeEntry>> = HashMap::new();
        for row in rows {
            let tenant_id: Uuid = column(&row, "tenant_id")?;
            by_tenant.entry(tenant_id).or_default().push(row_to_entry(&row)?);
        }
        Ok(by_tenant)
    }
}

fn not_found(tenant_id: &TenantId) -> DomainError {
    DomainError::new(ErrorCode::TenantNotFound, format!("Tenant not found: {}", tenant_id))
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn get_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM tenants WHERE id = $1", TENANT_COLUMNS))
            .bind(tenant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error("fetch tenant"))?
            .ok_or_else(|| not_found(tenant_id))?;

        let mut knowledge = self.knowledge_for(&[*tenant_id.as_uuid()]).await?;
        row_to_tenant(&row, knowledge.remove(tenant_id.as_uuid()).unwrap_or_default())
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tenants WHERE active ORDER BY name",
            TENANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("list active tenants"))?;

        let ids = rows
            .iter()
            .map(|row| column::<Uuid>(row, "id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut knowledge = self.knowledge_for(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| row_to_tenant(row, knowledge.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn set_admin_channel(
        &self,
        tenant_id: &TenantId,
        channel_id: &str,
    ) -> Result<Option<String>, DomainError> {
        let previous: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            UPDATE tenants t SET admin_channel_id = $2
            FROM (SELECT id, admin_channel_id FROM tenants WHERE id = $1 FOR UPDATE) old
            WHERE t.id = old.id
            RETURNING old.admin_channel_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("set admin channel"))?;

        previous.map(|(channel,)| channel).ok_or_else(|| not_found(tenant_id))
    }
}

fn row_to_tenant(row: &PgRow, knowledge: Vec<KnowledgeEntry>) -> Result<Tenant, DomainError> {
    let default_language = language(column(row, "default_language")?)?;
    let supported: Vec<String> = column(row, "supported_languages")?;
    let supported = supported
        .into_iter()
        .map(language)
        .collect::<Result<Vec<_>, _>>()?;
    let agency_name: String = column(row, "agency_name")?;

    let mut config = TenantConfig::new(agency_name, default_language)
        .with_booking_slots(column(row, "booking_slots")?)
        .with_knowledge(knowledge);
    if !supported.is_empty() {
        config = config.with_languages(supported);
    }

    Ok(Tenant {
        id: TenantId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        admin_channel_id: column(row, "admin_channel_id")?,
        active: column(row, "active")?,
        config,
    })
}

fn row_to_entry(row: &PgRow) -> Result<KnowledgeEntry, DomainError> {
    let priority: i16 = column(row, "priority")?;
    let keywords: Vec<String> = column(row, "keywords")?;
    let entry = KnowledgeEntry::new(
        column::<String>(row, "title")?,
        column::<String>(row, "content")?,
        keywords,
        language(column(row, "language")?)?,
        priority.clamp(0, KnowledgeEntry::MAX_PRIORITY as i16) as u8,
    )
    .map_err(|e| DomainError::database(format!("Invalid knowledge entry: {}", e)))?;
    Ok(entry.with_category(column::<String>(row, "category")?))
}

fn language(code: String) -> Result<Language, DomainError> {
    Language::new(&code).map_err(|e| DomainError::database(format!("Invalid language {}: {}", code, e)))
}
