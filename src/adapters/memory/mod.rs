//! In-memory adapters for tests and single-node runs.

mod lead_store;
mod property_matcher;
mod recording_gateway;
mod tenant_repository;

pub use lead_store::InMemoryLeadStore;
pub use property_matcher::StaticPropertyMatcher;
pub use recording_gateway::{RecordingGateway, SentMessage};
pub use tenant_repository::InMemoryTenantRepository;
