use std::collections::BTreeMap;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{
    scheduler::{Scheduler, SchedulerSettings},
    store::StoreError,
    JobHandlers, JobRegistry, RegistryError,
};
use crate::config::JobsConfig;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("job '{0}' has a schedule but no handler")]
    MissingHandler(String),
    #[error("failed to register job '{job_id}': {source}")]
    Registry {
        job_id: String,
        #[source]
        source: RegistryError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Upserts every configured schedule with its handler.
///
/// A schedule without a handler is a configuration error and aborts startup.
/// Handlers without a schedule and stored jobs no longer in the configuration
/// only produce warnings.
pub async fn register_scheduled_jobs(
    config: &JobsConfig,
    registry: &JobRegistry,
    handlers: &JobHandlers,
) -> Result<(), SupervisorError> {
    let schedules: BTreeMap<_, _> = config.schedules.iter().collect();

    for (job_id, policy) in schedules {
        let handler = handlers
            .get(job_id)
            .ok_or_else(|| SupervisorError::MissingHandler(job_id.clone()))?;

        let definition = registry
            .upsert_local(job_id, policy.clone(), handler)
            .await
            .map_err(|source| SupervisorError::Registry {
                job_id: job_id.clone(),
                source,
            })?;

        info!(
            "📅 Job '{}' runs at {:02}:{:02} {} ({:02}:{:02} UTC), next run at {}",
            job_id,
            policy.hour,
            policy.minute,
            policy.timezone,
            definition.rule.hour(),
            definition.rule.minute(),
            definition.next_run_at
        );
    }

    for name in handlers.names() {
        if !config.schedules.contains_key(name) {
            warn!("⚠️ Job '{}' has a handler but no schedule, it will not run", name);
        }
    }

    for definition in registry.list().await? {
        if !config.schedules.contains_key(&definition.job_id) {
            warn!(
                "⚠️ Stored job '{}' is not configured anymore, remove it with `jobs unregister`",
                definition.job_id
            );
        }
    }

    Ok(())
}

/// Spawns the scheduler loop. Call [`Scheduler::shutdown`] and await the
/// handle to stop it and drain running jobs.
pub fn start_scheduler(config: &JobsConfig, registry: JobRegistry) -> (Scheduler, JoinHandle<()>) {
    let scheduler = Scheduler::new(registry, SchedulerSettings::from(config));

    info!("🚀 Starting job scheduler");
    let task = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run().await }
    });

    (scheduler, task)
}
