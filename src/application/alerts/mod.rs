//! Admin-channel alerting.

mod alert_dispatcher;

pub use alert_dispatcher::{AlertDispatcher, AlertOutcome, AlertSettings, SkipReason};
