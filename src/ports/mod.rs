//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `LeadStore` - Field-scoped lead persistence with optimistic versions
//! - `TenantRepository` - Tenant configuration, knowledge snapshots, admin registration
//!
//! ## Collaborator Ports
//!
//! - `MessagingGateway` - Outbound delivery to prospects and admins
//! - `CompletionService` - Free-text reply generation
//! - `PropertyMatcher` - Listing lookup for value propositions

mod completion_service;
mod lead_store;
mod messaging_gateway;
mod property_matcher;
mod tenant_repository;

pub use completion_service::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use lead_store::LeadStore;
pub use messaging_gateway::{DeliveryError, MessagingGateway};
pub use property_matcher::{PropertyCriteria, PropertyMatcher, PropertySummary};
pub use tenant_repository::TenantRepository;
