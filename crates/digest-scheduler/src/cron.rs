//! Lightweight cron expression parser.
//! Supports: "SEC MIN HOUR DOM MON DOW" (6-field) and "MIN HOUR DOM MON DOW"
//! (5-field, fires at second 0).
//! Field syntax: *, */N, N, A-B, A-B/N, N/S, and comma lists of these.
//! Day of week: 0-7, both 0 and 7 are Sunday.
//! Example: "0 27 22 * * 1-5" = weekdays at 22:27:00
//!
//! Evaluated in whatever timezone the `after` instant carries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use digest_core::error::{DigestError, Result};

/// Upper bound on search steps; each step skips at least one second and at
/// most a whole day.
const SEARCH_LIMIT: usize = 500_000;

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    seconds: Vec<u32>,
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days_of_month: Vec<u32>,
    months: Vec<u32>,
    days_of_week: Vec<u32>,
    /// DOM field was `*`-based.
    dom_any: bool,
    /// DOW field was `*`-based.
    dow_any: bool,
}

impl CronSchedule {
    /// Parse a 5- or 6-field expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        let (sec_spec, rest) = match parts.len() {
            6 => (parts[0], &parts[1..]),
            5 => ("0", &parts[..]),
            _ => {
                return Err(DigestError::Schedule(format!(
                    "Invalid cron expression: '{expression}' (need 5 or 6 fields: [SEC] MIN HOUR DOM MON DOW)"
                )));
            }
        };

        let field = |spec: &str, name: &str, min: u32, max: u32| {
            parse_field(spec, min, max).ok_or_else(|| {
                DigestError::Schedule(format!(
                    "Invalid {name} field '{spec}' in cron expression '{expression}'"
                ))
            })
        };

        let mut days_of_week = field(rest[4], "day-of-week", 0, 7)?;
        for d in days_of_week.iter_mut() {
            if *d == 7 {
                *d = 0;
            }
        }
        days_of_week.sort_unstable();
        days_of_week.dedup();

        Ok(Self {
            expression: expression.trim().to_string(),
            seconds: field(sec_spec, "second", 0, 59)?,
            minutes: field(rest[0], "minute", 0, 59)?,
            hours: field(rest[1], "hour", 0, 23)?,
            days_of_month: field(rest[2], "day-of-month", 1, 31)?,
            months: field(rest[3], "month", 1, 12)?,
            days_of_week,
            dom_any: rest[2].starts_with('*'),
            dow_any: rest[4].starts_with('*'),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether the schedule fires at all on `date`.
    /// When both DOM and DOW are restricted, either may match.
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        let dom = self.days_of_month.contains(&date.day());
        let dow = self
            .days_of_week
            .contains(&date.weekday().num_days_from_sunday());
        match (self.dom_any, self.dow_any) {
            (false, false) => dom || dow,
            _ => dom && dow,
        }
    }

    /// Next fire time strictly after `after`, in the same timezone.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let start = after.naive_local().with_nanosecond(0)?;
        let mut candidate = start + Duration::seconds(1);

        for _ in 0..SEARCH_LIMIT {
            if !self.matches_date(candidate.date()) {
                candidate = candidate.date().succ_opt()?.and_time(NaiveTime::MIN);
                continue;
            }
            if !self.hours.contains(&candidate.hour()) {
                candidate = truncate_to_hour(candidate)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(&candidate.minute()) {
                candidate = truncate_to_minute(candidate)? + Duration::minutes(1);
                continue;
            }
            if !self.seconds.contains(&candidate.second()) {
                candidate += Duration::seconds(1);
                continue;
            }
            match tz.from_local_datetime(&candidate).earliest() {
                Some(fire) if fire > *after => return Some(fire),
                // Skipped by a DST gap, or folded back behind `after`
                _ => candidate += Duration::seconds(1),
            }
        }

        tracing::warn!("Cron expression '{}' never fires", self.expression);
        None
    }
}

fn truncate_to_hour(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.date().and_hms_opt(t.hour(), 0, 0)
}

fn truncate_to_minute(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.date().and_hms_opt(t.hour(), t.minute(), 0)
}

/// Parse a cron field into a sorted list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let mut values = Vec::new();

    for part in field.split(',') {
        let part = part.trim();
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let n: u32 = step.parse().ok()?;
                if n == 0 {
                    return None;
                }
                (range, Some(n))
            }
            None => (part, None),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            (a.parse().ok()?, b.parse().ok()?)
        } else {
            let n: u32 = range.parse().ok()?;
            // "N/S" runs from N to the end of the range
            if step.is_some() { (n, max) } else { (n, n) }
        };

        if lo < min || hi > max || lo > hi {
            return None;
        }
        values.extend((lo..=hi).step_by(step.unwrap_or(1) as usize));
    }

    values.sort_unstable();
    values.dedup();
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_every_hour() {
        let cron = CronSchedule::parse("0 * * * *").unwrap();
        let next = cron.next_after(&at(2026, 2, 22, 10, 30, 0)).unwrap();
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 0);
        assert_eq!(next.second(), 0);
    }

    #[test]
    fn test_specific_time() {
        let cron = CronSchedule::parse("0 8 * * *").unwrap();
        let next = cron.next_after(&at(2026, 2, 22, 7, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 2, 22, 8, 0, 0));
    }

    #[test]
    fn test_every_15_minutes() {
        let cron = CronSchedule::parse("*/15 * * * *").unwrap();
        let next = cron.next_after(&at(2026, 2, 22, 10, 2, 0)).unwrap();
        assert_eq!(next.minute(), 15);
    }

    #[test]
    fn test_weekday_evening_same_day() {
        let cron = CronSchedule::parse("0 27 22 * * 1-5").unwrap();
        // Monday morning
        let next = cron.next_after(&at(2026, 10, 19, 10, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 19, 22, 27, 0));
    }

    #[test]
    fn test_weekday_evening_skips_weekend() {
        let cron = CronSchedule::parse("00 27 22 * * 1-5").unwrap();
        // Friday, after the slot
        let next = cron.next_after(&at(2026, 10, 23, 23, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 26, 22, 27, 0));
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_fire_time_itself_is_excluded() {
        let cron = CronSchedule::parse("0 27 22 * * 1-5").unwrap();
        let next = cron.next_after(&at(2026, 10, 19, 22, 27, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 20, 22, 27, 0));
    }

    #[test]
    fn test_seconds_field() {
        let cron = CronSchedule::parse("*/20 * * * * *").unwrap();
        let next = cron.next_after(&at(2026, 10, 19, 10, 0, 5)).unwrap();
        assert_eq!(next, at(2026, 10, 19, 10, 0, 20));
    }

    #[test]
    fn test_sunday_as_seven() {
        let cron = CronSchedule::parse("0 0 * * 7").unwrap();
        let next = cron.next_after(&at(2026, 10, 19, 12, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 25, 0, 0, 0));
    }

    #[test]
    fn test_dom_or_dow_when_both_restricted() {
        let cron = CronSchedule::parse("0 0 1 * 1").unwrap();
        // Tuesday Oct 27: Nov 1 (Sunday) comes before Monday Nov 2
        let next = cron.next_after(&at(2026, 10, 27, 12, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 11, 1, 0, 0, 0));
        // Monday Oct 19 at noon: next Monday wins
        let next = cron.next_after(&at(2026, 10, 19, 12, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 10, 26, 0, 0, 0));
    }

    #[test]
    fn test_impossible_date_never_fires() {
        let cron = CronSchedule::parse("0 0 30 2 *").unwrap();
        assert!(cron.next_after(&at(2026, 1, 1, 0, 0, 0)).is_none());
    }

    #[test]
    fn test_parse_field_forms() {
        assert_eq!(parse_field("0-30/10", 0, 59), Some(vec![0, 10, 20, 30]));
        assert_eq!(parse_field("5/20", 0, 59), Some(vec![5, 25, 45]));
        assert_eq!(parse_field("3,1,3", 0, 59), Some(vec![1, 3]));
        assert_eq!(parse_field("1-5", 0, 7), Some(vec![1, 2, 3, 4, 5]));
        assert_eq!(parse_field("*/0", 0, 59), None);
        assert_eq!(parse_field("5-1", 0, 59), None);
        assert_eq!(parse_field("60", 0, 59), None);
    }

    #[test]
    fn test_invalid_expression() {
        assert!(CronSchedule::parse("bad").is_err());
        assert!(CronSchedule::parse("61 * * * *").is_err());
        assert!(CronSchedule::parse("* * * * * * *").is_err());
        assert!(CronSchedule::parse("0 0 0 * *").is_err());
    }

    #[test]
    fn test_matches_date() {
        let cron = CronSchedule::parse("0 27 22 * * 1-5").unwrap();
        assert!(cron.matches_date(NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()));
        assert!(!cron.matches_date(NaiveDate::from_ymd_opt(2026, 10, 24).unwrap()));
        assert_eq!(cron.expression(), "0 27 22 * * 1-5");
    }
}
