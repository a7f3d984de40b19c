//! Pivotal Tracker v5 client — three authenticated GETs.
//! Failures are returned as `DigestError::Tracker`; nothing is retried.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use digest_core::config::TrackerConfig;
use digest_core::error::{DigestError, Result};
use digest_core::traits::TrackerSource;
use digest_core::types::{Activity, DaySnapshot, SnapshotEntry, Story};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Tracker client bound to one project and API token.
pub struct PivotalClient {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl PivotalClient {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DigestError::Tracker(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn project_url(&self, path: &str) -> String {
        self.api_url(&format!("projects/{}/{}", self.config.project_id, path))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        tracing::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .header("X-TrackerToken", &self.config.api_token)
            .query(query)
            .send()
            .await
            .map_err(|e| DigestError::Tracker(format!("{what} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<TrackerApiError>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(body);
            return Err(DigestError::Tracker(format!(
                "{what} failed with {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DigestError::Tracker(format!("Invalid {what} response: {e}")))
    }
}

#[async_trait]
impl TrackerSource for PivotalClient {
    async fn fetch_activity(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Activity>> {
        let activity: Vec<Activity> = self
            .get_json(
                &self.api_url("my/activity"),
                &[
                    ("occurred_before", window_end.timestamp_millis().to_string()),
                    ("occurred_after", window_start.timestamp_millis().to_string()),
                ],
                "activity",
            )
            .await?;
        tracing::debug!("Fetched {} activity records", activity.len());
        Ok(activity)
    }

    async fn fetch_snapshot(&self, day: NaiveDate) -> Result<Vec<SnapshotEntry>> {
        let day = day.format("%Y-%m-%d").to_string();
        let days: Vec<DaySnapshot> = self
            .get_json(
                &self.project_url("history/snapshots"),
                &[("start_date", day.clone()), ("end_date", day)],
                "snapshot",
            )
            .await?;
        let current = days.into_iter().next().map(|d| d.current).unwrap_or_default();
        tracing::debug!("Fetched {} snapshot entries", current.len());
        Ok(current)
    }

    async fn fetch_stories(&self, ids: &[u64], owner_id: &str) -> Result<Vec<Story>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
        let stories: Vec<Story> = self
            .get_json(
                &self.project_url("stories"),
                &[("filter", format!("id:{ids} owner:{owner_id}"))],
                "stories",
            )
            .await?;
        tracing::debug!("Fetched {} stories", stories.len());
        Ok(stories)
    }
}

/// Error body returned by the tracker on non-2xx responses.
#[derive(Debug, Deserialize)]
struct TrackerApiError {
    #[serde(default)]
    error: Option<String>,
}
