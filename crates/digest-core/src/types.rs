//! Tracker wire types — the JSON records returned by the project tracker.
//! Only the fields the digest reads are modelled; everything else is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity event kinds emitted by the tracker feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StoryCreateActivity,
    StoryUpdateActivity,
    CommentCreateActivity,
    CommentUpdateActivity,
    /// Any kind the digest does not care about (deletes, moves, tasks...).
    #[serde(other)]
    Other,
}

impl ActivityKind {
    pub fn is_story_event(&self) -> bool {
        matches!(self, Self::StoryCreateActivity | Self::StoryUpdateActivity)
    }

    pub fn is_comment_event(&self) -> bool {
        matches!(self, Self::CommentCreateActivity | Self::CommentUpdateActivity)
    }
}

/// One entry of the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    /// Transition label, e.g. "added", "started", "accepted".
    #[serde(default)]
    pub highlight: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    pub project: ProjectRef,
    #[serde(default)]
    pub primary_resources: Vec<Resource>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Activity {
    /// The story this activity is about, if any.
    pub fn story_resource(&self) -> Option<&Resource> {
        self.primary_resources.iter().find(|r| r.kind == "story")
    }

    /// Whether a story change in this activity moved the story out of "rejected".
    pub fn was_rejected(&self) -> bool {
        self.changes.iter().any(|c| {
            c.kind == "story"
                && c.original_values
                    .as_ref()
                    .and_then(|v| v.current_state.as_deref())
                    == Some("rejected")
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A resource referenced by an activity (usually a story).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A single change carried by an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub kind: String,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub original_values: Option<ChangeValues>,
    #[serde(default)]
    pub new_values: Option<ChangeValues>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValues {
    #[serde(default)]
    pub current_state: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A day in the project history snapshot response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaySnapshot {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub current: Vec<SnapshotEntry>,
}

/// State of one story at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub story_id: u64,
    pub state: String,
}

/// A story as returned by the story list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub current_state: Option<String>,
}
