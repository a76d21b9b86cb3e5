//! Per-lead critical sections.
//!
//! Two inbound messages from the same prospect must not run the engine
//! concurrently, while messages from different prospects never wait on each
//! other. Locks are keyed by `(tenant_id, external_ref)` and created on demand;
//! an entry is removed as soon as nobody holds or awaits it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::TenantId;

type LockKey = (TenantId, String);
type LockMap = HashMap<LockKey, Arc<Mutex<()>>>;

/// Registry of per-lead async mutexes.
#[derive(Debug, Clone, Default)]
pub struct LeadLocks {
    map: Arc<StdMutex<LockMap>>,
}

impl LeadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to one lead.
    pub async fn acquire(&self, tenant_id: TenantId, external_ref: &str) -> LeadGuard {
        let key = (tenant_id, external_ref.to_string());
        let slot = {
            let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.clone()).or_default())
        };
        // Registered before awaiting so a cancelled waiter still cleans up.
        let registration = Registration {
            key,
            map: Arc::clone(&self.map),
            slot: Some(Arc::clone(&slot)),
        };
        let guard = slot.lock_owned().await;
        LeadGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of leads currently locked or awaited.
    pub fn len(&self) -> usize {
        self.map.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one lead; released on drop.
#[derive(Debug)]
pub struct LeadGuard {
    // Field order matters: the mutex guard drops before the registration.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

#[derive(Debug)]
struct Registration {
    key: LockKey,
    map: Arc<StdMutex<LockMap>>,
    slot: Option<Arc<Mutex<()>>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        drop(self.slot.take());
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = map
            .get(&self.key)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if unused {
            map.remove(&self.key);
        }
    }
}
