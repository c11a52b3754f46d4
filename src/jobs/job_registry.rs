use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    lease::JobLeases,
    store::{JobStore, StoreError},
    JobDefinition, JobHandler,
};
use crate::schedule::{LocalSchedulePolicy, Occurrence, RecurrenceRule, ScheduleError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maps job ids to their handlers and persisted definitions.
///
/// Registration is an upsert: registering an id that already exists updates
/// that definition instead of adding a second one.
#[derive(Clone)]
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
    handlers: Arc<DashMap<String, JobHandler>>,
    policies: Arc<DashMap<String, LocalSchedulePolicy>>,
    leases: JobLeases,
}

impl JobRegistry {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            handlers: Arc::new(DashMap::new()),
            policies: Arc::new(DashMap::new()),
            leases: JobLeases::default(),
        }
    }

    /// Registers `job_id` with a fixed UTC recurrence.
    pub async fn upsert(
        &self,
        job_id: &str,
        rule: RecurrenceRule,
        handler: JobHandler,
    ) -> Result<JobDefinition, RegistryError> {
        let now = Utc::now();
        let next = rule.next_occurrence(now)?;
        self.store_definition(job_id, now, next, None, handler).await
    }

    /// Registers `job_id` with a local wall-clock policy. The UTC rule is
    /// derived now and re-derived every time the job is rescheduled.
    pub async fn upsert_local(
        &self,
        job_id: &str,
        policy: LocalSchedulePolicy,
        handler: JobHandler,
    ) -> Result<JobDefinition, RegistryError> {
        let now = Utc::now();
        let next = policy.next_occurrence(now)?;
        self.store_definition(job_id, now, next, Some(policy), handler)
            .await
    }

    async fn store_definition(
        &self,
        job_id: &str,
        now: DateTime<Utc>,
        next: Occurrence,
        policy: Option<LocalSchedulePolicy>,
        handler: JobHandler,
    ) -> Result<JobDefinition, RegistryError> {
        let _lease = self.leases.acquire(job_id).await;

        let definition = match self.store.get(job_id).await? {
            // Same rule: keep the persisted state so an overdue run is still caught up
            Some(existing) if existing.rule == next.rule => {
                debug!(
                    "📅 Job '{}' already registered with '{}', next run at {}",
                    job_id, existing.rule, existing.next_run_at
                );
                existing
            }
            // A due run still happens once; the new rule applies from then on
            Some(mut existing) if existing.is_due(now) => {
                info!(
                    "📅 Job '{}' rule changed from '{}' to '{}', pending run at {} kept",
                    job_id, existing.rule, next.rule, existing.next_run_at
                );
                existing.rule = next.rule;
                self.store.save(&existing).await?;
                existing
            }
            Some(mut existing) => {
                info!(
                    "📅 Job '{}' rescheduled from '{}' to '{}'",
                    job_id, existing.rule, next.rule
                );
                existing.reschedule(next);
                self.store.save(&existing).await?;
                existing
            }
            None => {
                info!("📅 Job '{}' registered with '{}'", job_id, next.rule);
                let definition = JobDefinition::new(job_id, next);
                self.store.save(&definition).await?;
                definition
            }
        };

        match policy {
            Some(policy) => {
                self.policies.insert(job_id.to_string(), policy);
            }
            None => {
                self.policies.remove(job_id);
            }
        }
        self.handlers.insert(job_id.to_string(), handler);
        Ok(definition)
    }

    /// Removes the job's definition and handler. Returns whether a
    /// definition was stored.
    pub async fn unregister(&self, job_id: &str) -> Result<bool, StoreError> {
        let _lease = self.leases.acquire(job_id).await;

        self.handlers.remove(job_id);
        self.policies.remove(job_id);
        let removed = self.store.delete(job_id).await?;

        if removed {
            info!("🗑️ Job '{}' unregistered", job_id);
        }
        Ok(removed)
    }

    pub async fn status(&self, job_id: &str) -> Result<Option<JobDefinition>, StoreError> {
        self.store.get(job_id).await
    }

    pub async fn list(&self) -> Result<Vec<JobDefinition>, StoreError> {
        self.store.list().await
    }

    pub fn is_registered(&self, job_id: &str) -> bool {
        self.handlers.contains_key(job_id)
    }

    pub(crate) fn handler(&self, job_id: &str) -> Option<JobHandler> {
        self.handlers.get(job_id).map(|handler| Arc::clone(handler.value()))
    }

    /// Next regular occurrence after `after`, using the job's local policy
    /// when it has one.
    pub(crate) fn next_regular(
        &self,
        definition: &JobDefinition,
        after: DateTime<Utc>,
    ) -> Result<Occurrence, ScheduleError> {
        let policy = self
            .policies
            .get(&definition.job_id)
            .map(|policy| policy.value().clone());

        match policy {
            Some(policy) => policy.next_occurrence(after),
            None => definition.rule.next_occurrence(after),
        }
    }

    pub(crate) fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    pub(crate) const fn leases(&self) -> &JobLeases {
        &self.leases
    }
}

impl Debug for JobRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut job_ids: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        job_ids.sort();

        f.debug_struct("JobRegistry")
            .field("handlers", &job_ids)
            .finish_non_exhaustive()
    }
}
