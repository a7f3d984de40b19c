//! # Digest Scheduler
//!
//! Fires the daily digest on a cron schedule.
//!
//! ## Architecture
//! ```text
//! Scheduler (tokio interval, local time)
//!   └── Task: "0 27 22 * * 1-5" → "daily-digest"
//!         └── on trigger → tokio::spawn(run)  (runs never share state)
//! ```

pub mod cron;
pub mod engine;
pub mod tasks;

pub use cron::CronSchedule;
pub use engine::{SchedulerEngine, spawn_scheduler};
pub use tasks::Task;
