//! Application layer - Handlers and background services.
//!
//! This layer orchestrates domain operations and coordinates between ports:
//! the inbound message handler, admin registration, hot-lead alerting and the
//! per-tenant engagement schedulers.

pub mod alerts;
pub mod engagement;
pub mod handlers;
pub mod lead_locks;

pub use alerts::{AlertDispatcher, AlertOutcome, AlertSettings, SkipReason};
pub use engagement::{
    DigestRunReport, DigestTimer, EngagementSupervisor, PollReport, SchedulerDeps,
    SchedulerSettings, TenantScheduler,
};
pub use handlers::{
    AdminRegistered, BotControlError, BotControlHandler, BotStatus, HandleMessageCommand,
    HandleMessageError, HandleMessageHandler, HandleMessageResult, RegisterAdminCommand,
    RegisterAdminError, RegisterAdminHandler,
};
pub use lead_locks::{LeadGuard, LeadLocks};
