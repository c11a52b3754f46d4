use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{recurrence::Occurrence, RecurrenceRule, ScheduleError};

/// How far past a skipped local time we look to find the offset that
/// applies once the clocks have moved forward. Real gaps are at most two hours.
const GAP_PROBE_HOURS: i64 = 3;

/// Desired local wall-clock time in a named IANA timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSchedulePolicy {
    pub hour: u32,
    pub minute: u32,
    pub timezone: String,
}

impl LocalSchedulePolicy {
    pub fn new(hour: u32, minute: u32, timezone: impl Into<String>) -> Result<Self, ScheduleError> {
        let policy = Self {
            hour,
            minute,
            timezone: timezone.into(),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        parse_timezone(&self.timezone)?;
        local_time(NaiveDate::MIN, self.hour, self.minute)?;
        Ok(())
    }

    /// The next local firing strictly after `after`, with the UTC rule
    /// derived for that firing's date.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Result<Occurrence, ScheduleError> {
        let timezone = parse_timezone(&self.timezone)?;
        let mut date = after.with_timezone(&timezone).date_naive();

        // Today or tomorrow always qualifies; the third day covers a gap
        // adjustment landing exactly on `after`.
        for _ in 0..3 {
            let at = resolve_local(&timezone, date, self.hour, self.minute)?;
            if at > after {
                return Ok(Occurrence {
                    rule: RecurrenceRule::daily(at.hour(), at.minute())?,
                    at,
                });
            }
            date = date.succ_opt().ok_or_else(|| {
                ScheduleError::InvalidRecurrence(format!("no date after {date}"))
            })?;
        }

        Err(ScheduleError::InvalidRecurrence(format!(
            "no local occurrence of {:02}:{:02} {} after {after}",
            self.hour, self.minute, self.timezone
        )))
    }
}

/// Converts a local wall-clock time in `timezone_name` on `reference_date`
/// into a fixed daily UTC recurrence.
///
/// The offset is the one the zone uses on `reference_date`, so the result
/// differs between summer and winter for zones that observe daylight saving.
/// When the local time falls in a transition the offset in effect right after
/// the transition is used: the later (standard) offset in an overlap, the
/// post-jump offset in a gap.
pub fn compute_daily_utc_recurrence(
    local_hour: u32,
    local_minute: u32,
    timezone_name: &str,
    reference_date: NaiveDate,
) -> Result<RecurrenceRule, ScheduleError> {
    let timezone = parse_timezone(timezone_name)?;
    let utc = resolve_local(&timezone, reference_date, local_hour, local_minute)?;

    RecurrenceRule::daily(utc.hour(), utc.minute())
}

fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

fn local_time(date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime, ScheduleError> {
    date.and_hms_opt(hour, minute, 0)
        .ok_or(ScheduleError::InvalidLocalTime { hour, minute })
}

fn resolve_local(
    timezone: &Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Utc>, ScheduleError> {
    let local = local_time(date, hour, minute)?;

    let offset = match timezone.offset_from_local_datetime(&local) {
        LocalResult::Single(offset) => offset.fix(),
        // Clocks went back: the smaller offset is the post-transition one.
        LocalResult::Ambiguous(first, second) => {
            let (first, second) = (first.fix(), second.fix());
            if first.local_minus_utc() <= second.local_minus_utc() {
                first
            } else {
                second
            }
        }
        LocalResult::None => offset_after_gap(timezone, local, hour, minute)?,
    };

    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    Ok(Utc.from_utc_datetime(&utc))
}

fn offset_after_gap(
    timezone: &Tz,
    local: NaiveDateTime,
    hour: u32,
    minute: u32,
) -> Result<FixedOffset, ScheduleError> {
    timezone
        .offset_from_local_datetime(&(local + TimeDelta::hours(GAP_PROBE_HOURS)))
        .latest()
        .map(|offset| offset.fix())
        .ok_or(ScheduleError::InvalidLocalTime { hour, minute })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_istanbul_has_fixed_offset() {
        let winter = compute_daily_utc_recurrence(15, 8, "Europe/Istanbul", date(2026, 1, 15)).unwrap();
        let summer = compute_daily_utc_recurrence(15, 8, "Europe/Istanbul", date(2026, 7, 15)).unwrap();

        assert_eq!((winter.hour(), winter.minute()), (12, 8));
        assert_eq!(winter, summer);
    }

    #[test]
    fn test_dst_zone_differs_by_one_hour_between_seasons() {
        let winter = compute_daily_utc_recurrence(15, 8, "Europe/Berlin", date(2026, 1, 15)).unwrap();
        let summer = compute_daily_utc_recurrence(15, 8, "Europe/Berlin", date(2026, 7, 15)).unwrap();

        assert_eq!((winter.hour(), winter.minute()), (14, 8));
        assert_eq!((summer.hour(), summer.minute()), (13, 8));
        assert_eq!(winter.hour() - summer.hour(), 1);
    }

    #[test]
    fn test_southern_hemisphere_dst_is_inverted() {
        let january = compute_daily_utc_recurrence(15, 8, "Australia/Sydney", date(2026, 1, 15)).unwrap();
        let july = compute_daily_utc_recurrence(15, 8, "Australia/Sydney", date(2026, 7, 15)).unwrap();

        // AEDT (+11) in January, AEST (+10) in July
        assert_eq!(january.hour(), 4);
        assert_eq!(july.hour(), 5);
    }

    #[test]
    fn test_gap_uses_offset_after_transition() {
        // 02:30 does not exist in Berlin on 2026-03-29; CEST (+2) applies afterwards.
        let rule = compute_daily_utc_recurrence(2, 30, "Europe/Berlin", date(2026, 3, 29)).unwrap();
        assert_eq!((rule.hour(), rule.minute()), (0, 30));
    }

    #[test]
    fn test_overlap_uses_offset_after_transition() {
        // 02:30 happens twice in Berlin on 2026-10-25; CET (+1) applies afterwards.
        let rule = compute_daily_utc_recurrence(2, 30, "Europe/Berlin", date(2026, 10, 25)).unwrap();
        assert_eq!((rule.hour(), rule.minute()), (1, 30));
    }

    #[test]
    fn test_crossing_midnight_in_utc() {
        let rule = compute_daily_utc_recurrence(1, 15, "Asia/Tokyo", date(2026, 5, 1)).unwrap();
        assert_eq!((rule.hour(), rule.minute()), (16, 15));
    }

    #[test]
    fn test_unknown_timezone() {
        assert_eq!(
            compute_daily_utc_recurrence(15, 8, "Mars/Olympus", date(2026, 1, 15)),
            Err(ScheduleError::InvalidTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_invalid_local_time() {
        assert_eq!(
            compute_daily_utc_recurrence(25, 0, "UTC", date(2026, 1, 15)),
            Err(ScheduleError::InvalidLocalTime { hour: 25, minute: 0 })
        );
    }

    #[test]
    fn test_policy_validation() {
        assert!(LocalSchedulePolicy::new(15, 8, "Europe/Istanbul").is_ok());
        assert!(LocalSchedulePolicy::new(15, 61, "Europe/Istanbul").is_err());
        assert!(LocalSchedulePolicy::new(15, 8, "Nowhere/City").is_err());
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let policy = LocalSchedulePolicy::new(15, 8, "Europe/Berlin").unwrap();
        let after = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();

        let occurrence = policy.next_occurrence(after).unwrap();

        assert_eq!(occurrence.at, Utc.with_ymd_and_hms(2026, 1, 15, 14, 8, 0).unwrap());
        assert_eq!(occurrence.rule, RecurrenceRule::daily(14, 8).unwrap());
    }

    #[test]
    fn test_next_occurrence_follows_dst_change() {
        // Berlin springs forward overnight into 2026-03-29.
        let policy = LocalSchedulePolicy::new(15, 8, "Europe/Berlin").unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 28, 14, 8, 0).unwrap();

        let occurrence = policy.next_occurrence(after).unwrap();

        assert_eq!(occurrence.at, Utc.with_ymd_and_hms(2026, 3, 29, 13, 8, 0).unwrap());
        assert_eq!(occurrence.rule, RecurrenceRule::daily(13, 8).unwrap());
    }
}
