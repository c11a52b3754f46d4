use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-job-id mutual exclusion.
///
/// Every mutation of a job's persisted state, and every execution of its
/// handler, happens while holding that job's lease. Different job ids never
/// contend.
#[derive(Clone, Debug, Default)]
pub(crate) struct JobLeases {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl JobLeases {
    fn lock_for(&self, job_id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(job_id.to_string()).or_default().clone()
    }

    /// Returns `None` while another holder (e.g. a running execution) has the lease.
    pub(crate) fn try_acquire(&self, job_id: &str) -> Option<OwnedMutexGuard<()>> {
        self.lock_for(job_id).try_lock_owned().ok()
    }

    pub(crate) async fn acquire(&self, job_id: &str) -> OwnedMutexGuard<()> {
        self.lock_for(job_id).lock_owned().await
    }
}
