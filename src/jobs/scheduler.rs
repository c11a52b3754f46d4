use std::{
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::FutureExt as _;
use tokio::{
    sync::OwnedMutexGuard,
    task::JoinHandle,
    time::{interval, timeout, MissedTickBehavior},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use super::{
    job_definition::{FailureOutcome, RetryPolicy},
    job_result::{panic_message, JobExecutionError, JobResult},
    store::StoreError,
    JobHandler, JobRegistry, RegistryError,
};
use crate::config::JobsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub poll_interval: Duration,
    pub job_timeout: Duration,
    pub retry: RetryPolicy,
    /// `None` waits for in-flight executions however long they take.
    pub shutdown_timeout: Option<Duration>,
}

impl From<&JobsConfig> for SchedulerSettings {
    fn from(config: &JobsConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
            job_timeout: Duration::from_secs(config.job_timeout_seconds.max(1)),
            retry: RetryPolicy {
                max_retries: config.max_retries.max(1),
                retry_delay: i64::try_from(config.retry_delay_seconds)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .unwrap_or(TimeDelta::MAX),
            },
            shutdown_timeout: config.shutdown_timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Polls the registry and executes due jobs.
///
/// Each execution runs on its own task while holding the job's lease, so a
/// job never overlaps with itself while different jobs run concurrently.
#[derive(Clone, Debug)]
pub struct Scheduler {
    registry: JobRegistry,
    settings: SchedulerSettings,
    executions: TaskTracker,
    shutdown: CancellationToken,
    abort: CancellationToken,
}

impl Scheduler {
    pub fn new(registry: JobRegistry, settings: SchedulerSettings) -> Self {
        Self {
            registry,
            settings,
            executions: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            abort: CancellationToken::new(),
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Runs until shut down, then drains in-flight executions.
    pub async fn run(&self) {
        info!(
            "📅 Scheduler started, polling every {:?}",
            self.settings.poll_interval
        );

        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("❌ Failed to poll scheduled jobs: {}", e);
                    }
                }
            }
        }

        self.drain().await;
    }

    /// Starts every job due at `now` and returns how many were started.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let started = self.dispatch_due(now).await?.len();
        if started > 0 {
            debug!("📅 Started {} due job(s)", started);
        }
        Ok(started)
    }

    /// Like [`Self::tick`] but waits for the started executions to finish.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let handles = self.dispatch_due(now).await?;
        let started = handles.len();

        for handle in handles {
            if let Err(e) = handle.await {
                error!("💥 Job execution task failed: {}", e);
            }
        }
        Ok(started)
    }

    async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<Vec<JoinHandle<()>>, StoreError> {
        let mut handles = Vec::new();

        for definition in self.registry.list().await? {
            if !definition.is_due(now) {
                continue;
            }

            let Some(handler) = self.registry.handler(&definition.job_id) else {
                debug!(
                    "📅 Job '{}' is due but has no handler in this process",
                    definition.job_id
                );
                continue;
            };

            // Taken before spawning so later ticks see the job as running
            let Some(lease) = self.registry.leases().try_acquire(&definition.job_id) else {
                debug!("⏳ Job '{}' is still running, skipping", definition.job_id);
                continue;
            };

            let execution = Execution {
                registry: self.registry.clone(),
                settings: self.settings,
                abort: self.abort.clone(),
                job_id: definition.job_id,
                handler,
                now,
            };
            handles.push(self.executions.spawn(execution.run(lease)));
        }

        Ok(handles)
    }

    /// Stops accepting work and waits for in-flight executions. Once the
    /// shutdown timeout passes they are cancelled.
    pub async fn drain(&self) {
        self.executions.close();

        if !self.executions.is_empty() {
            info!(
                "🛑 Waiting for {} running job(s) to finish",
                self.executions.len()
            );
        }

        match self.settings.shutdown_timeout {
            None => self.executions.wait().await,
            Some(limit) => {
                if timeout(limit, self.executions.wait()).await.is_err() {
                    warn!(
                        "⏱️ Cancelling {} job(s) still running after {:?}",
                        self.executions.len(),
                        limit
                    );
                    self.abort.cancel();
                    self.executions.wait().await;
                }
            }
        }

        info!("📅 Scheduler stopped");
    }
}

struct Execution {
    registry: JobRegistry,
    settings: SchedulerSettings,
    abort: CancellationToken,
    job_id: String,
    handler: JobHandler,
    now: DateTime<Utc>,
}

impl Execution {
    async fn run(self, _lease: OwnedMutexGuard<()>) {
        if let Err(e) = self.run_locked().await {
            error!("❌ Failed to record run of job '{}': {}", self.job_id, e);
        }
    }

    async fn run_locked(&self) -> Result<(), RegistryError> {
        // The definition may have changed between listing and taking the lease
        let Some(mut definition) = self.registry.status(&self.job_id).await? else {
            return Ok(());
        };
        if !definition.is_due(self.now) {
            return Ok(());
        }

        info!("🔄 Running job '{}'", self.job_id);
        let started = Instant::now();
        let result = self.invoke().await;

        // Retries and the next occurrence count from when the run finished
        let finished_at = TimeDelta::from_std(started.elapsed())
            .ok()
            .and_then(|elapsed| self.now.checked_add_signed(elapsed))
            .unwrap_or(self.now);

        match result {
            JobResult::Completed => {
                let next = self.registry.next_regular(&definition, finished_at)?;
                definition.record_success(finished_at, next);
                info!(
                    "✅ Job '{}' completed, next run at {}",
                    self.job_id, definition.next_run_at
                );
            }
            JobResult::Failed(e) => {
                let next = self.registry.next_regular(&definition, finished_at)?;
                let outcome = definition.record_failure(
                    finished_at,
                    &self.settings.retry,
                    e.is_permanent(),
                    next,
                );

                match outcome {
                    FailureOutcome::RetryScheduled { attempt, at } => warn!(
                        "🔁 Job '{}' failed on attempt {}/{}: {}. Retrying at {}",
                        self.job_id, attempt, self.settings.retry.max_retries, e, at
                    ),
                    FailureOutcome::GaveUp => error!(
                        "❌ Job '{}' failed: {}. Next run at {}",
                        self.job_id, e, definition.next_run_at
                    ),
                }
            }
            JobResult::Cancelled => {
                warn!("🛑 Job '{}' cancelled by shutdown", self.job_id);
                return Ok(());
            }
        }

        self.registry.store().save(&definition).await?;
        Ok(())
    }

    async fn invoke(&self) -> JobResult {
        // Calling the handler may panic before it hands back a future
        let handler = AssertUnwindSafe(async { (self.handler)().await }).catch_unwind();

        tokio::select! {
            biased;
            () = self.abort.cancelled() => JobResult::Cancelled,
            outcome = timeout(self.settings.job_timeout, handler) => match outcome {
                Ok(Ok(Ok(()))) => JobResult::Completed,
                Ok(Ok(Err(e))) => JobResult::Failed(e.into()),
                Ok(Err(payload)) => {
                    JobResult::Failed(JobExecutionError::Panicked(panic_message(payload.as_ref())))
                }
                Err(_) => JobResult::Failed(JobExecutionError::Timeout(self.settings.job_timeout)),
            },
        }
    }
}
