//! Supervision of per-tenant scheduler tasks.
//!
//! Every running tenant bot owns one scheduler task, started and stopped with
//! the bot. A slow or failing tenant never delays another. A scheduler that
//! panics is restarted after `restart_delay`; one that was stopped is not.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::foundation::TenantId;

use super::scheduler::{SchedulerDeps, SchedulerSettings, TenantScheduler};

struct TenantTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Starts, stops and restarts tenant schedulers.
pub struct EngagementSupervisor {
    deps: SchedulerDeps,
    settings: SchedulerSettings,
    restart_delay: Duration,
    tasks: Mutex<HashMap<TenantId, TenantTask>>,
}

impl EngagementSupervisor {
    pub fn new(deps: SchedulerDeps, settings: SchedulerSettings, restart_delay: Duration) -> Self {
        Self {
            deps,
            settings,
            restart_delay,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts the tenant's scheduler. Returns false if it is already running.
    pub async fn start_tenant(&self, tenant_id: TenantId) -> bool {
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get(&tenant_id) {
            if !task.handle.is_finished() {
                return false;
            }
        }

        let (shutdown, rx) = watch::channel(false);
        let scheduler = Arc::new(TenantScheduler::new(
            tenant_id,
            self.deps.clone(),
            self.settings.clone(),
        ));
        let handle = tokio::spawn(supervise(scheduler, rx, self.restart_delay));
        tasks.insert(tenant_id, TenantTask { shutdown, handle });
        info!(tenant_id = %tenant_id, "tenant scheduler started");
        true
    }

    /// Signals the tenant's scheduler and waits for it to finish its current
    /// unit. Returns false if it was not running.
    pub async fn stop_tenant(&self, tenant_id: TenantId) -> bool {
        let task = self.tasks.lock().await.remove(&tenant_id);
        match task {
            Some(task) => {
                stop(tenant_id, task).await;
                true
            }
            None => false,
        }
    }

    /// Tenants with a live scheduler, in id order.
    pub async fn running_tenants(&self) -> Vec<TenantId> {
        let tasks = self.tasks.lock().await;
        let mut running: Vec<TenantId> = tasks
            .iter()
            .filter(|(_, task)| !task.handle.is_finished())
            .map(|(id, _)| *id)
            .collect();
        running.sort();
        running
    }

    /// Stops every scheduler.
    pub async fn shutdown_all(&self) {
        let drained: Vec<(TenantId, TenantTask)> = self.tasks.lock().await.drain().collect();
        for (_, task) in &drained {
            let _ = task.shutdown.send(true);
        }
        for (tenant_id, task) in drained {
            stop(tenant_id, task).await;
        }
        info!("all tenant schedulers stopped");
    }
}

async fn stop(tenant_id: TenantId, task: TenantTask) {
    let _ = task.shutdown.send(true);
    if let Err(e) = task.handle.await {
        error!(tenant_id = %tenant_id, error = %e, "tenant supervisor ended abnormally");
    }
    info!(tenant_id = %tenant_id, "tenant scheduler stopped");
}

async fn supervise(
    scheduler: Arc<TenantScheduler>,
    mut shutdown: watch::Receiver<bool>,
    restart_delay: Duration,
) {
    let tenant_id = scheduler.tenant_id();
    loop {
        let run = {
            let scheduler = Arc::clone(&scheduler);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run(shutdown).await })
        };

        match run.await {
            Ok(()) => break,
            Err(e) if e.is_panic() => {
                error!(
                    tenant_id = %tenant_id,
                    restart_in_ms = restart_delay.as_millis() as u64,
                    "tenant scheduler panicked, restarting"
                );
            }
            Err(_) => break,
        }

        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(restart_delay) => {}
        }
    }
}
