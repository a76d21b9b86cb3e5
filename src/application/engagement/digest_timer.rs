//! Daily digest timer.
//!
//! A single process-wide task that wakes at the configured UTC hour and fans
//! out one digest job per active tenant.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::application::alerts::{AlertDispatcher, AlertOutcome, SkipReason};
use crate::domain::conversation::OutboundMessage;
use crate::domain::engagement::DailyDigest;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::tenant::Tenant;
use crate::ports::{LeadStore, TenantRepository};

/// Tally of one digest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestRunReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct DigestTimer {
    tenants: Arc<dyn TenantRepository>,
    leads: Arc<dyn LeadStore>,
    alerts: Arc<AlertDispatcher>,
    hour_utc: u32,
}

impl DigestTimer {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        leads: Arc<dyn LeadStore>,
        alerts: Arc<AlertDispatcher>,
        hour_utc: u32,
    ) -> Self {
        Self {
            tenants,
            leads,
            alerts,
            hour_utc,
        }
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let wait = until_next_run(self.hour_utc, Utc::now());
            info!(hour_utc = self.hour_utc, wait_secs = wait.as_secs(), "next daily digest scheduled");

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {
                    let report = self.run_once(Timestamp::now()).await;
                    info!(
                        delivered = report.delivered,
                        skipped = report.skipped,
                        failed = report.failed,
                        "daily digest finished"
                    );
                }
            }
        }
    }

    /// Builds and delivers digests for every active tenant concurrently.
    pub async fn run_once(&self, now: Timestamp) -> DigestRunReport {
        let mut report = DigestRunReport::default();
        let tenants = match self.tenants.list_active_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                error!(error = %e, "failed to list tenants for daily digest");
                return report;
            }
        };

        let mut jobs = JoinSet::new();
        for tenant in tenants {
            let leads = Arc::clone(&self.leads);
            let alerts = Arc::clone(&self.alerts);
            jobs.spawn(async move { deliver_digest(tenant, leads, alerts, now).await });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(Ok(AlertOutcome::Delivered { .. })) => report.delivered += 1,
                Ok(Ok(AlertOutcome::Skipped(_))) => report.skipped += 1,
                Ok(Ok(AlertOutcome::Failed { .. })) => report.failed += 1,
                Ok(Err(e)) => {
                    warn!(error = %e, "failed to load leads for daily digest");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "digest job aborted");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

async fn deliver_digest(
    tenant: Tenant,
    leads: Arc<dyn LeadStore>,
    alerts: Arc<AlertDispatcher>,
    now: Timestamp,
) -> Result<AlertOutcome, DomainError> {
    if tenant.admin_channel().is_none() {
        info!(tenant_id = %tenant.id, "no admin channel registered, daily digest skipped");
        return Ok(AlertOutcome::Skipped(SkipReason::NoAdminChannel));
    }

    let window = ChronoDuration::hours(DailyDigest::WINDOW_HOURS);
    let touched = leads
        .leads_touched_since(&tenant.id, now.minus(window))
        .await
        .map_err(|e| e.with_detail("tenant_id", tenant.id.to_string()))?;

    let digest = DailyDigest::build(tenant.id, &touched, now, window);
    let message = OutboundMessage::text(digest.render(&tenant.config.agency_name));
    Ok(alerts.send_to_admin(&tenant, &message).await)
}

/// Time from `now` until the next `hour_utc:00`, strictly in the future.
pub fn until_next_run(hour_utc: u32, now: DateTime<Utc>) -> Duration {
    let today = now
        .date_naive()
        .and_hms_opt(hour_utc.min(23), 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive));
    let Some(today) = today else {
        return Duration::from_secs(24 * 60 * 60);
    };
    let next = if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
