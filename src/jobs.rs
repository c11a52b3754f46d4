pub mod job_definition;
pub mod job_handlers;
pub mod job_registry;
pub mod job_result;
pub mod job_supervisor;
mod lease;
pub mod scheduler;
pub mod store;

use std::{future::Future, pin::Pin, sync::Arc};

use thiserror::Error;

pub use job_definition::JobDefinition;
pub use job_handlers::JobHandlers;
pub use job_registry::{JobRegistry, RegistryError};
pub use scheduler::Scheduler;

/// Error returned by a job handler.
#[derive(Debug, Error)]
pub enum JobError {
    /// Retrying this occurrence is pointless; wait for the next regular run.
    #[error("{0}")]
    FailPermanently(String),
    #[error("{0}")]
    TryAgainLater(String),
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased handler bound to a job id. The scheduler only ever sees this,
/// never the concrete job type.
pub type JobHandler = Arc<dyn Fn() -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// A recurring job with a stable name.
pub trait Job: Send + Sync + 'static {
    fn name() -> &'static str;

    fn execute(&self) -> impl Future<Output = Result<(), JobError>> + Send;
}

/// Wraps a closure returning a future into a [`JobHandler`].
pub fn handler_fn<F, Fut>(f: F) -> JobHandler
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Wraps a [`Job`] value into a [`JobHandler`].
pub fn job_handler<J: Job>(job: J) -> JobHandler {
    let job = Arc::new(job);
    handler_fn(move || {
        let job = Arc::clone(&job);
        async move { job.execute().await }
    })
}
