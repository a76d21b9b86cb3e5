//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `lead` - Lead record, funnel state, ghost stage and field-scoped patches
//! - `tenant` - Agencies and their bot configuration
//! - `knowledge` - Keyword-scored knowledge retrieval
//! - `conversation` - The per-lead conversation engine
//! - `engagement` - Nudge policy and the daily digest

pub mod conversation;
pub mod engagement;
pub mod foundation;
pub mod knowledge;
pub mod lead;
pub mod tenant;
