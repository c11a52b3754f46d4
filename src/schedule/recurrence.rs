use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::ScheduleError;

/// A timezone-independent recurrence: fixed UTC hour and minute, optionally
/// restricted to one day of the week.
///
/// This is the form that gets persisted, so a job keeps firing at the same
/// instant even when the local-time calculation is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    hour: u32,
    minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_week: Option<Weekday>,
}

/// The next firing of a job together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub rule: RecurrenceRule,
    pub at: DateTime<Utc>,
}

impl RecurrenceRule {
    /// Fires every day at `hour:minute` UTC.
    pub fn daily(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        Self::build(hour, minute, None)
    }

    /// Fires once a week on `day` at `hour:minute` UTC.
    pub fn weekly(day: Weekday, hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        Self::build(hour, minute, Some(day))
    }

    fn build(hour: u32, minute: u32, day_of_week: Option<Weekday>) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "{hour:02}:{minute:02} is not a valid UTC time of day"
            )));
        }

        Ok(Self {
            hour,
            minute,
            day_of_week,
        })
    }

    #[must_use]
    pub const fn hour(&self) -> u32 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u32 {
        self.minute
    }

    #[must_use]
    pub const fn day_of_week(&self) -> Option<Weekday> {
        self.day_of_week
    }

    /// Seven-field expression understood by the `cron` crate
    /// (`sec min hour day-of-month month day-of-week year`).
    #[must_use]
    pub fn cron_expression(&self) -> String {
        let day_of_week = self
            .day_of_week
            .map_or_else(|| "*".to_string(), |day| day.to_string());

        format!("0 {} {} * * {} *", self.minute, self.hour, day_of_week)
    }

    pub fn schedule(&self) -> Result<cron::Schedule, ScheduleError> {
        cron::Schedule::from_str(&self.cron_expression())
            .map_err(|e| ScheduleError::InvalidRecurrence(e.to_string()))
    }

    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        self.schedule()?.after(&after).next().ok_or_else(|| {
            ScheduleError::InvalidRecurrence(format!("'{self}' has no upcoming occurrence"))
        })
    }

    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Result<Occurrence, ScheduleError> {
        Ok(Occurrence {
            rule: *self,
            at: self.next_after(after)?,
        })
    }
}

impl Display for RecurrenceRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cron_expression())
    }
}
