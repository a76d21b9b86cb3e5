//! Lead domain module.
//!
//! A lead is one prospect's conversation with a tenant's bot. Its
//! conversation fields, ghost stage and alert flag are written by three
//! independent writers through field-scoped [`LeadPatch`]es.

mod conversation_state;
mod ghost_stage;
mod lead;
mod qualification;
mod urgency;

pub use conversation_state::ConversationState;
pub use ghost_stage::GhostStage;
pub use lead::{Lead, LeadPatch};
pub use qualification::{BudgetRange, Goal, PropertyType, Purpose, TransactionType};
pub use urgency::UrgencyScore;
