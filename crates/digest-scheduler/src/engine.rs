//! Scheduler Engine — the main loop that checks and triggers tasks.
//! Uses tokio::interval for ticking; each firing runs as its own tokio task,
//! so a slow run never delays the next check.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use tokio::sync::Mutex;

use crate::tasks::Task;

/// The scheduler engine — owns tasks and decides when they are due.
#[derive(Default)]
pub struct SchedulerEngine {
    tasks: Vec<Task>,
}

impl SchedulerEngine {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task, scheduling its first run after `now`.
    pub fn add_task<Tz: TimeZone>(&mut self, mut task: Task, now: &DateTime<Tz>) {
        task.schedule_from(now);
        match &task.next_run {
            Some(next) => tracing::info!(
                "📅 Task added: '{}' ({}), next run {}",
                task.name,
                task.schedule.expression(),
                next.with_timezone(&Local)
            ),
            None => tracing::warn!(
                "⚠️ Task '{}' ({}) has no upcoming run",
                task.name,
                task.schedule.expression()
            ),
        }
        self.tasks.push(task);
    }

    /// Remove a task by name.
    pub fn remove_task(&mut self, name: &str) -> bool {
        let len = self.tasks.len();
        self.tasks.retain(|t| t.name != name);
        self.tasks.len() < len
    }

    /// List all tasks.
    pub fn list_tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Enable/disable a task.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.name == name) {
            task.enabled = enabled;
        }
    }

    /// Tick — called periodically to find due tasks.
    /// Returns the names of the tasks that fired.
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<String> {
        let mut triggered = Vec::new();

        for task in self.tasks.iter_mut() {
            if !task.should_run(now) {
                continue;
            }
            tracing::info!("🔔 Task triggered: '{}'", task.name);
            task.mark_fired(now);
            triggered.push(task.name.clone());
        }

        triggered
    }

    /// Get task count.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

/// Run the scheduler loop forever, spawning `on_trigger` for every firing.
///
/// Runs share nothing; if one is still in flight when the next slot comes
/// round, both proceed independently.
pub async fn spawn_scheduler<F, Fut>(
    engine: Arc<Mutex<SchedulerEngine>>,
    on_trigger: F,
    check_interval_secs: u64,
) where
    F: Fn(String, DateTime<Local>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        "⏰ Scheduler started (check every {}s)",
        check_interval_secs
    );

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(check_interval_secs.max(1)));

    loop {
        interval.tick().await;

        let now = Local::now();
        let triggered = {
            let mut eng = engine.lock().await;
            eng.tick(&now)
        };

        for name in triggered {
            tokio::spawn(on_trigger(name, now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, m, s).unwrap()
    }

    #[test]
    fn test_add_and_list() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("daily", "0 27 22 * * 1-5").unwrap(), &at(19, 10, 0, 0));
        assert_eq!(engine.task_count(), 1);
        assert_eq!(engine.list_tasks()[0].next_run, Some(at(19, 22, 27, 0)));
    }

    #[test]
    fn test_tick_fires_once_per_slot() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("daily", "0 27 22 * * 1-5").unwrap(), &at(19, 10, 0, 0));

        assert!(engine.tick(&at(19, 22, 26, 59)).is_empty());
        assert_eq!(engine.tick(&at(19, 22, 27, 0)), vec!["daily".to_string()]);
        assert!(engine.tick(&at(19, 22, 27, 1)).is_empty());

        let task = &engine.list_tasks()[0];
        assert_eq!(task.run_count, 1);
        assert_eq!(task.next_run, Some(at(20, 22, 27, 0)));
    }

    #[test]
    fn test_friday_run_schedules_monday() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("daily", "0 27 22 * * 1-5").unwrap(), &at(23, 9, 0, 0));
        assert_eq!(engine.tick(&at(23, 22, 27, 0)).len(), 1);
        assert_eq!(engine.list_tasks()[0].next_run, Some(at(26, 22, 27, 0)));
        assert!(engine.tick(&at(24, 22, 27, 0)).is_empty());
    }

    #[test]
    fn test_disabled_task_does_not_fire() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("daily", "0 27 22 * * *").unwrap(), &at(19, 10, 0, 0));
        engine.set_enabled("daily", false);
        assert!(engine.tick(&at(19, 23, 0, 0)).is_empty());
        engine.set_enabled("daily", true);
        assert_eq!(engine.tick(&at(19, 23, 0, 0)).len(), 1);
    }

    #[test]
    fn test_remove_task() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("daily", "0 8 * * *").unwrap(), &at(19, 0, 0, 0));
        assert!(engine.remove_task("daily"));
        assert!(!engine.remove_task("daily"));
        assert_eq!(engine.task_count(), 0);
    }

    #[tokio::test]
    async fn test_spawn_scheduler_runs_trigger() {
        let mut engine = SchedulerEngine::new();
        engine.add_task(Task::cron("every-second", "* * * * * *").unwrap(), &Local::now());
        let engine = Arc::new(Mutex::new(engine));

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = tokio::spawn(spawn_scheduler(
            engine.clone(),
            move |name, _| {
                let counter = counter.clone();
                async move {
                    assert_eq!(name, "every-second");
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            },
            1,
        ));

        tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
        handle.abort();

        assert!(fired.load(Ordering::SeqCst) >= 1);
        assert!(engine.lock().await.list_tasks()[0].run_count >= 1);
    }
}
