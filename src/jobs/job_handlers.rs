use std::{collections::HashMap, fmt};

use super::{job_handler, Job, JobHandler};

/// Handlers the application provides, keyed by job id.
///
/// Built once at boot and matched against the configured schedules.
#[derive(Clone, Default)]
pub struct JobHandlers {
    handlers: HashMap<String, JobHandler>,
}

impl JobHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a [`Job`] under its own name.
    #[must_use]
    pub fn register<J: Job>(mut self, job: J) -> Self {
        self.handlers.insert(J::name().to_string(), job_handler(job));
        self
    }

    #[must_use]
    pub fn register_fn(mut self, job_id: impl Into<String>, handler: JobHandler) -> Self {
        self.handlers.insert(job_id.into(), handler);
        self
    }

    pub fn get(&self, job_id: &str) -> Option<JobHandler> {
        self.handlers.get(job_id).cloned()
    }

    /// Sorted job ids.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for JobHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandlers")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{handler_fn, JobError};

    struct Cleanup;

    impl Job for Cleanup {
        fn name() -> &'static str {
            "cleanup"
        }

        async fn execute(&self) -> Result<(), JobError> {
            Err(JobError::FailPermanently("nothing to clean".to_string()))
        }
    }

    #[tokio::test]
    async fn test_registers_job_under_its_name() {
        let handlers = JobHandlers::new()
            .register(Cleanup)
            .register_fn("report", handler_fn(|| async { Ok(()) }));

        assert_eq!(handlers.names(), ["cleanup", "report"]);

        let cleanup = handlers.get("cleanup").unwrap();
        assert!(matches!(cleanup().await, Err(JobError::FailPermanently(_))));
        assert!(handlers.get("missing").is_none());
    }
}
