//! Task definitions — a named cron schedule and its run bookkeeping.

use chrono::{DateTime, TimeZone, Utc};
use digest_core::error::Result;

use crate::cron::CronSchedule;

/// A scheduled task.
#[derive(Debug, Clone)]
pub struct Task {
    /// Human-readable name, unique within an engine.
    pub name: String,
    /// When to trigger.
    pub schedule: CronSchedule,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last triggered timestamp.
    pub last_run: Option<DateTime<Utc>>,
    /// Next scheduled run.
    pub next_run: Option<DateTime<Utc>>,
    /// How many times this task has fired.
    pub run_count: u32,
    /// Whether the task is enabled.
    pub enabled: bool,
}

impl Task {
    /// Create a cron-scheduled task. `next_run` is filled in by the engine.
    pub fn cron(name: &str, expression: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            schedule: CronSchedule::parse(expression)?,
            created_at: Utc::now(),
            last_run: None,
            next_run: None,
            run_count: 0,
            enabled: true,
        })
    }

    /// Check if this task should run at `now`.
    pub fn should_run<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        if !self.enabled {
            return false;
        }
        match &self.next_run {
            Some(next) => *now >= *next,
            None => false,
        }
    }

    /// Recompute `next_run` from `now`, evaluating the cron fields in `now`'s timezone.
    pub fn schedule_from<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.next_run = self
            .schedule
            .next_after(now)
            .map(|t| t.with_timezone(&Utc));
    }

    /// Record a firing at `now` and move on to the following slot.
    pub fn mark_fired<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.last_run = Some(now.with_timezone(&Utc));
        self.run_count += 1;
        self.schedule_from(now);
    }
}
