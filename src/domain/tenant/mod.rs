//! Tenant domain module.
//!
//! Tenants are isolated agencies; their configuration and knowledge base are
//! never shared and are passed by reference into every operation that needs them.

mod knowledge_entry;
mod tenant;

pub use knowledge_entry::KnowledgeEntry;
pub use tenant::{Tenant, TenantConfig};
