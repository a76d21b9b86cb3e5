//! Per-tenant engagement scheduler.
//!
//! Polls the lead store for inactive leads and sends staged nudges. Each lead
//! is an idempotent unit: reserve the next ghost stage with a versioned write,
//! send, and on a failed send write the previous stage back so the next poll
//! retries. A reservation conflict means the lead changed under us; it is
//! skipped this round.
//!
//! The release is attempted twice. If both writes fail, the lead keeps the
//! reserved stage although nothing was sent, and that nudge is not retried.
//!
//! ## Graceful Shutdown
//!
//! The shutdown channel is checked between leads only, so a unit that has
//! reserved a stage always finishes its send or compensation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::conversation::{templates, OutboundMessage};
use crate::domain::engagement::{NudgeKind, NudgePolicy};
use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::domain::knowledge::KnowledgeRetriever;
use crate::domain::lead::{Lead, LeadPatch, Purpose};
use crate::domain::tenant::Tenant;
use crate::ports::{LeadStore, MessagingGateway, TenantRepository};

/// Writes attempted when handing a reserved stage back.
const RELEASE_ATTEMPTS: usize = 2;

/// Configuration for a [`TenantScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Pause between successful polls.
    pub poll_interval: Duration,
    pub policy: NudgePolicy,
    /// First delay after an infrastructure failure.
    pub backoff_initial: Duration,
    /// Upper bound for the doubling backoff.
    pub backoff_max: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30 * 60),
            policy: NudgePolicy::default(),
            backoff_initial: Duration::from_secs(5),
            backoff_max: Duration::from_secs(5 * 60),
        }
    }
}

/// Doubling delay, capped, reset after a good poll.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: None,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => current.saturating_mul(2).min(self.max),
        };
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// What happened during one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub candidates: usize,
    pub sent: usize,
    /// Not due yet, or changed concurrently.
    pub skipped: usize,
    /// Reservation or delivery failed; retried next poll.
    pub failed: usize,
    /// Shutdown arrived before every candidate was processed.
    pub interrupted: bool,
}

enum UnitResult {
    Sent,
    Conflict,
    Failed,
}

/// Shared handles a scheduler needs.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub tenants: Arc<dyn TenantRepository>,
    pub leads: Arc<dyn LeadStore>,
    pub gateway: Arc<dyn MessagingGateway>,
}

/// Engagement loop for exactly one tenant.
pub struct TenantScheduler {
    tenant_id: TenantId,
    deps: SchedulerDeps,
    settings: SchedulerSettings,
}

impl TenantScheduler {
    pub fn new(tenant_id: TenantId, deps: SchedulerDeps, settings: SchedulerSettings) -> Self {
        Self {
            tenant_id,
            deps,
            settings,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(self.settings.backoff_initial, self.settings.backoff_max);
        info!(tenant_id = %self.tenant_id, "engagement scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delay = match self.poll_at(Timestamp::now(), &shutdown).await {
                Ok(report) => {
                    backoff.reset();
                    if report.sent > 0 || report.failed > 0 {
                        info!(
                            tenant_id = %self.tenant_id,
                            candidates = report.candidates,
                            sent = report.sent,
                            failed = report.failed,
                            "engagement poll finished"
                        );
                    }
                    self.settings.poll_interval
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        tenant_id = %self.tenant_id,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "engagement poll failed"
                    );
                    delay
                }
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(tenant_id = %self.tenant_id, "engagement scheduler stopped");
    }

    /// One poll evaluated at `now`.
    ///
    /// Errors are infrastructure failures (tenant lookup, lead query); per-lead
    /// failures are counted in the report instead.
    pub async fn poll_at(
        &self,
        now: Timestamp,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<PollReport, DomainError> {
        let tenant = self.deps.tenants.get_tenant(&self.tenant_id).await?;
        let mut report = PollReport::default();
        if !tenant.active {
            debug!(tenant_id = %self.tenant_id, "tenant inactive, poll skipped");
            return Ok(report);
        }

        let policy = &self.settings.policy;
        let leads = self
            .deps
            .leads
            .query_inactive_leads(&tenant.id, policy.cutoff(now), &NudgePolicy::OPEN_STAGES)
            .await?;
        report.candidates = leads.len();

        for lead in &leads {
            if *shutdown.borrow() {
                report.interrupted = true;
                break;
            }
            let Some(kind) = policy.decide(lead, now) else {
                report.skipped += 1;
                continue;
            };
            match self.nudge(&tenant, lead, kind).await {
                UnitResult::Sent => report.sent += 1,
                UnitResult::Conflict => report.skipped += 1,
                UnitResult::Failed => report.failed += 1,
            }
        }

        Ok(report)
    }

    async fn nudge(&self, tenant: &Tenant, lead: &Lead, kind: NudgeKind) -> UnitResult {
        let reserve = LeadPatch::ghost_stage(kind.target_stage());
        match self
            .deps
            .leads
            .update_lead_fields(&tenant.id, &lead.id, &reserve, Some(lead.version))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                debug!(tenant_id = %tenant.id, lead_id = %lead.id, "lead changed during poll, skipped");
                return UnitResult::Conflict;
            }
            Err(e) => {
                warn!(tenant_id = %tenant.id, lead_id = %lead.id, error = %e, "failed to reserve nudge");
                return UnitResult::Failed;
            }
        }

        let message = compose(tenant, lead, kind);
        match self
            .deps
            .gateway
            .send(&tenant.id, &lead.external_ref, &message)
            .await
        {
            Ok(()) => {
                info!(
                    tenant_id = %tenant.id,
                    lead_id = %lead.id,
                    nudge = kind.as_str(),
                    "nudge sent"
                );
                UnitResult::Sent
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant.id,
                    lead_id = %lead.id,
                    nudge = kind.as_str(),
                    error = %e,
                    "nudge delivery failed, releasing reservation"
                );
                self.release(tenant, lead).await;
                UnitResult::Failed
            }
        }
    }

    /// Writes the lead's previous stage back, unversioned.
    async fn release(&self, tenant: &Tenant, lead: &Lead) {
        let release = LeadPatch::ghost_stage(lead.ghost_stage);
        for attempt in 1..=RELEASE_ATTEMPTS {
            match self
                .deps
                .leads
                .update_lead_fields(&tenant.id, &lead.id, &release, None)
                .await
            {
                Ok(_) => return,
                Err(e) if attempt < RELEASE_ATTEMPTS => {
                    warn!(tenant_id = %tenant.id, lead_id = %lead.id, error = %e, "release failed, retrying");
                }
                Err(e) => {
                    error!(
                        tenant_id = %tenant.id,
                        lead_id = %lead.id,
                        stage = %lead.ghost_stage,
                        error = %e,
                        "failed to release nudge reservation"
                    );
                }
            }
        }
    }
}

fn compose(tenant: &Tenant, lead: &Lead, kind: NudgeKind) -> OutboundMessage {
    match kind {
        NudgeKind::Fast => OutboundMessage::text(templates::fast_nudge(lead)),
        NudgeKind::Value => {
            let config = &tenant.config;
            let query = lead.purpose.as_ref().map(Purpose::as_str).unwrap_or_default();
            let insight = KnowledgeRetriever::new(&config.knowledge_base)
                .top(query, lead.language_or(&config.default_language));
            OutboundMessage::text(templates::value_nudge(lead, insight.as_ref()))
        }
    }
}
