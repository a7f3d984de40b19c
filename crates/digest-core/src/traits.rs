//! Collaborator traits — the seams between the report pipeline and the
//! outside world. The tracker client and the chat notifier implement these;
//! tests swap in in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::{Activity, SnapshotEntry, Story};

/// Read side: the project tracker.
#[async_trait]
pub trait TrackerSource: Send + Sync {
    /// Activity that occurred inside `[window_start, window_end]`, newest first.
    async fn fetch_activity(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Activity>>;

    /// Story states recorded for `day`.
    async fn fetch_snapshot(&self, day: NaiveDate) -> Result<Vec<SnapshotEntry>>;

    /// Stories among `ids` owned by `owner_id`.
    async fn fetch_stories(&self, ids: &[u64], owner_id: &str) -> Result<Vec<Story>>;
}

/// Write side: a chat channel the digest is posted to.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn post(&self, channel: &str, text: &str) -> Result<()>;
}
