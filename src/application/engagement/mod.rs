//! Engagement: staged nudges for inactive leads and the daily admin digest.

mod digest_timer;
mod scheduler;
mod supervisor;

pub use digest_timer::{until_next_run, DigestRunReport, DigestTimer};
pub use scheduler::{Backoff, PollReport, SchedulerDeps, SchedulerSettings, TenantScheduler};
pub use supervisor::EngagementSupervisor;
