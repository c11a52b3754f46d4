use std::{
    any::Any,
    fmt::{Display, Formatter, Result},
    time::Duration,
};

use thiserror::Error;

use crate::jobs::JobError;

#[derive(Debug, Error)]
pub enum JobExecutionError {
    #[error("handler failed: {0}")]
    HandlerFailure(#[from] JobError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl JobExecutionError {
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::HandlerFailure(JobError::FailPermanently(_)))
    }
}

pub enum JobResult {
    Completed,
    Failed(JobExecutionError),
    /// Interrupted by shutdown; nothing is recorded for it.
    Cancelled,
}

impl Display for JobResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed(e) => write!(f, "error: {e}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fail_permanently_is_permanent() {
        let permanent = JobExecutionError::from(JobError::FailPermanently("gone".to_string()));
        let transient = JobExecutionError::from(JobError::TryAgainLater("busy".to_string()));

        assert!(permanent.is_permanent());
        assert!(!transient.is_permanent());
        assert!(!JobExecutionError::Timeout(Duration::from_secs(1)).is_permanent());
    }

    #[test]
    fn test_panic_message_reads_str_and_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
