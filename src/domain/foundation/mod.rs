//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the lead concierge domain.

mod errors;
mod ids;
mod language;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{LeadId, TenantId};
pub use language::Language;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
