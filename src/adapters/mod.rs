//! Adapters - Implementations of the ports.
//!
//! - `ai` - completion services (OpenAI-compatible, mock)
//! - `gateway` - outbound messaging (webhook, log-only)
//! - `memory` - in-memory stores, recording gateway, static listings
//! - `postgres` - PostgreSQL stores
//! - `http` - axum REST API

pub mod ai;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;

pub use ai::{MockCompletionService, MockResponse, OpenAiCompletionService, OpenAiConfig};
pub use gateway::{HttpMessagingGateway, LoggingGateway};
pub use memory::{
    InMemoryLeadStore, InMemoryTenantRepository, RecordingGateway, SentMessage,
    StaticPropertyMatcher,
};
pub use postgres::{PostgresLeadStore, PostgresTenantRepository, MIGRATOR};
