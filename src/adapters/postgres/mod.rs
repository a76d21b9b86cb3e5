//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresLeadStore` - Field-scoped lead writes with optimistic versions
//! - `PostgresTenantRepository` - Tenants, bot configuration and knowledge base

mod lead_store;
mod tenant_repository;

pub use lead_store::PostgresLeadStore;
pub use tenant_repository::PostgresTenantRepository;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row};
use std::fmt::Display;
use std::str::FromStr;

use crate::domain::foundation::DomainError;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn database_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", name, e)))
}

fn parse_enum<T>(row: &PgRow, name: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| DomainError::database(format!("Invalid {} '{}': {}", name, raw, e)))
}

fn optional_enum<T>(row: &PgRow, name: &str) -> Result<Option<T>, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = column(row, name)?;
    raw.map(|raw| {
        raw.parse()
            .map_err(|e| DomainError::database(format!("Invalid {} '{}': {}", name, raw, e)))
    })
    .transpose()
}
