use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use crate::database::models::job_status::JobStatus;
use crate::schedule::{Occurrence, RecurrenceRule};

/// How failed runs of an occurrence are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per occurrence, including the first one.
    pub max_retries: u32,
    pub retry_delay: TimeDelta,
}

/// What happened to a definition after a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    RetryScheduled { attempt: u32, at: DateTime<Utc> },
    GaveUp,
}

/// Persisted state of one recurring job.
///
/// There is exactly one definition per job id. The handler it runs lives in
/// the registry under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub job_id: String,
    pub rule: RecurrenceRule,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_status: JobStatus,
    pub retry_count: u32,
}

impl JobDefinition {
    #[must_use]
    pub fn new(job_id: impl Into<String>, next: Occurrence) -> Self {
        Self {
            job_id: job_id.into(),
            rule: next.rule,
            next_run_at: next.at,
            last_run_at: None,
            last_status: JobStatus::Pending,
            retry_count: 0,
        }
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at <= now
    }

    /// Replaces the rule and next run. History (`last_run_at`, `last_status`) is kept.
    pub fn reschedule(&mut self, next: Occurrence) {
        self.rule = next.rule;
        self.next_run_at = next.at;
        self.retry_count = 0;
    }

    pub fn record_success(&mut self, ran_at: DateTime<Utc>, next: Occurrence) {
        self.last_status = JobStatus::Succeeded;
        self.last_run_at = Some(ran_at);
        self.reschedule(next);
    }

    /// Counts a failed attempt. Below the retry budget the job is retried
    /// after the policy's delay; otherwise it is marked failed and moved to
    /// its next regular occurrence so it never gets stuck.
    pub fn record_failure(
        &mut self,
        ran_at: DateTime<Utc>,
        policy: &RetryPolicy,
        permanent: bool,
        next: Occurrence,
    ) -> FailureOutcome {
        self.last_run_at = Some(ran_at);
        self.retry_count += 1;

        let retry_at = ran_at.checked_add_signed(policy.retry_delay);
        if let Some(at) = retry_at.filter(|_| !permanent && self.retry_count < policy.max_retries) {
            self.next_run_at = at;
            return FailureOutcome::RetryScheduled {
                attempt: self.retry_count,
                at,
            };
        }

        self.last_status = JobStatus::Failed;
        self.reschedule(next);
        FailureOutcome::GaveUp
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    fn occurrence(day: u32) -> Occurrence {
        Occurrence {
            rule: RecurrenceRule::daily(12, 8).unwrap(),
            at: Utc.with_ymd_and_hms(2026, 1, day, 12, 8, 0).unwrap(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            retry_delay: TimeDelta::minutes(1),
        }
    }

    #[test]
    fn test_new_definition_is_pending() {
        let definition = JobDefinition::new("cleanup", occurrence(15));
        assert_eq!(definition.last_status, JobStatus::Pending);
        assert_eq!(definition.retry_count, 0);
        assert!(definition.last_run_at.is_none());
    }

    #[test]
    fn test_is_due_at_exact_time() {
        let definition = JobDefinition::new("cleanup", occurrence(15));
        assert!(!definition.is_due(at(12, 7)));
        assert!(definition.is_due(at(12, 8)));
    }

    #[test]
    fn test_failure_below_budget_schedules_retry() {
        let mut definition = JobDefinition::new("cleanup", occurrence(15));

        let outcome = definition.record_failure(at(12, 8), &policy(), false, occurrence(16));

        assert_eq!(
            outcome,
            FailureOutcome::RetryScheduled {
                attempt: 1,
                at: at(12, 9)
            }
        );
        assert_eq!(definition.last_status, JobStatus::Pending);
        assert_eq!(definition.retry_count, 1);
    }

    #[test]
    fn test_failure_at_budget_gives_up_and_moves_on() {
        let mut definition = JobDefinition::new("cleanup", occurrence(15));
        definition.retry_count = 2;

        let outcome = definition.record_failure(at(12, 10), &policy(), false, occurrence(16));

        assert_eq!(outcome, FailureOutcome::GaveUp);
        assert_eq!(definition.last_status, JobStatus::Failed);
        assert_eq!(definition.next_run_at, occurrence(16).at);
        assert_eq!(definition.retry_count, 0);
    }

    #[test]
    fn test_permanent_failure_skips_retries() {
        let mut definition = JobDefinition::new("cleanup", occurrence(15));

        let outcome = definition.record_failure(at(12, 8), &policy(), true, occurrence(16));

        assert_eq!(outcome, FailureOutcome::GaveUp);
        assert_eq!(definition.last_status, JobStatus::Failed);
    }

    #[test]
    fn test_success_resets_retry_count() {
        let mut definition = JobDefinition::new("cleanup", occurrence(15));
        definition.retry_count = 2;

        definition.record_success(at(12, 10), occurrence(16));

        assert_eq!(definition.last_status, JobStatus::Succeeded);
        assert_eq!(definition.last_run_at, Some(at(12, 10)));
        assert_eq!(definition.next_run_at, occurrence(16).at);
        assert_eq!(definition.retry_count, 0);
    }
}
