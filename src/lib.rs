//! Estate Concierge - conversational lead qualification for real-estate agencies
//!
//! Multi-tenant core of an agency chat bot: a deterministic conversation
//! funnel with free-text fallback, a keyword knowledge retriever, hot-lead
//! alerts and per-tenant follow-up scheduling.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
