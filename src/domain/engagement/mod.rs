//! Engagement module: who gets nudged, and what the daily digest says.

mod digest;
mod policy;

pub use digest::{DailyDigest, DigestEntry};
pub use policy::{NudgeKind, NudgePolicy};
