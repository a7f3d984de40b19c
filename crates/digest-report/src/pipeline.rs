//! Daily report pipeline: activity → snapshot → stories, strictly in order,
//! then group, classify and render. Any fetch error aborts the run.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use digest_core::config::{ReportConfig, TrackerConfig};
use digest_core::error::{DigestError, Result};
use digest_core::traits::{Notifier, TrackerSource};
use digest_core::types::Activity;

use crate::classify::ClassifyOptions;
use crate::format::render_daily;
use crate::grouper::{StoryAggregate, StoryGrouper};

/// Builds one day's digest from a tracker source.
pub struct DailyReport {
    source: Arc<dyn TrackerSource>,
    project_id: String,
    owner_id: String,
    report: ReportConfig,
}

impl DailyReport {
    pub fn new(source: Arc<dyn TrackerSource>, tracker: &TrackerConfig, report: ReportConfig) -> Self {
        Self {
            source,
            project_id: tracker.project_id.clone(),
            owner_id: tracker.user_id.clone(),
            report,
        }
    }

    /// Fetch and group everything known about `date` (local time).
    pub async fn collect(&self, date: NaiveDate) -> Result<Vec<StoryAggregate>> {
        let (start, end) = day_window(date, &Local)?;

        let activity = self.source.fetch_activity(start, end).await?;
        let snapshot = self.source.fetch_snapshot(date).await?;
        let ids: Vec<u64> = snapshot.iter().map(|s| s.story_id).collect();
        let stories = self.source.fetch_stories(&ids, &self.owner_id).await?;

        let activity = oldest_first(activity, &self.project_id);
        tracing::debug!(
            "Grouping {} activities, {} snapshot entries, {} stories",
            activity.len(),
            snapshot.len(),
            stories.len()
        );

        let mut grouper = StoryGrouper::new(&self.report.comment_marker);
        grouper.fold(&activity);
        if !stories.is_empty() && !snapshot.is_empty() {
            grouper.merge_snapshot(&stories, &snapshot, &self.report.tracked_states);
        }
        Ok(grouper.finish())
    }

    /// Build the message text for `date`.
    pub async fn generate(&self, date: NaiveDate) -> Result<String> {
        tracing::info!("Building digest for {date}");
        let stories = self.collect(date).await?;
        let options = ClassifyOptions::from(&self.report);
        let message = render_daily(&stories, date, &options);
        tracing::info!("Digest for {date} covers {} stories", stories.len());
        Ok(message)
    }

    /// Build the message and post it. Nothing is posted if any fetch fails.
    pub async fn deliver(&self, date: NaiveDate, notifier: &dyn Notifier, channel: &str) -> Result<String> {
        let message = self.generate(date).await?;
        notifier.post(channel, &message).await?;
        tracing::info!("Digest for {date} posted via {} to {channel}", notifier.name());
        Ok(message)
    }
}

/// Keep the project's activity and flip the newest-first feed to oldest-first.
pub fn oldest_first(activity: Vec<Activity>, project_id: &str) -> Vec<Activity> {
    let mut activity: Vec<Activity> = activity
        .into_iter()
        .filter(|a| a.project.id.to_string() == project_id)
        .collect();
    activity.reverse();
    activity
}

/// Start of `date` to its last millisecond, in `tz`, as UTC instants.
pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = tz
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| DigestError::Schedule(format!("No local midnight on {date}")))?;
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| DigestError::Schedule("Invalid end-of-day time".into()))?;
    let end = tz
        .from_local_datetime(&date.and_time(last_ms))
        .latest()
        .ok_or_else(|| DigestError::Schedule(format!("No local end of day on {date}")))?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
