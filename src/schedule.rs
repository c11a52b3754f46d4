pub mod calculator;
pub mod recurrence;

pub use calculator::{compute_daily_utc_recurrence, LocalSchedulePolicy};
pub use recurrence::{Occurrence, RecurrenceRule};

use thiserror::Error;

/// Failures while turning a configured schedule into a UTC recurrence.
///
/// These are raised at startup and are fatal: a maintenance job that cannot
/// be scheduled must stop the process rather than silently never run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),
    #[error("invalid local time {hour:02}:{minute:02}")]
    InvalidLocalTime { hour: u32, minute: u32 },
    #[error("invalid recurrence: {0}")]
    InvalidRecurrence(String),
}
