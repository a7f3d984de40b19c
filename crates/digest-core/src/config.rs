//! Daily digest configuration system.
//!
//! Loaded once at process start from `~/.daily-digest/config.toml` (or an
//! explicit path), then overlaid with environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DigestError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl DigestConfig {
    /// Load config from the default path (~/.daily-digest/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DigestError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DigestError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the daily-digest home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".daily-digest")
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PIVOTAL_PROJECT_ID") {
            self.tracker.project_id = v;
        }
        if let Some(v) = get("PIVOTAL_API_TOKEN") {
            self.tracker.api_token = v;
        }
        if let Some(v) = get("PIVOTAL_USER_ID") {
            self.tracker.user_id = v;
        }
        if let Some(v) = get("SLACK_TOKEN") {
            self.slack.token = v;
        }
        if let Some(v) = get("DAILY_SLACK_CHANNEL") {
            self.slack.channel = v;
        }
        if let Some(v) = get("DAILY_DIGEST_CRON") {
            self.schedule.cron = v;
        }
    }

    /// Check that everything needed to read from the tracker is present.
    pub fn validate_tracker(&self) -> Result<()> {
        let t = &self.tracker;
        if t.project_id.is_empty() {
            return Err(DigestError::Config("tracker.project_id is not set (PIVOTAL_PROJECT_ID)".into()));
        }
        if t.api_token.is_empty() {
            return Err(DigestError::Config("tracker.api_token is not set (PIVOTAL_API_TOKEN)".into()));
        }
        if t.user_id.is_empty() {
            return Err(DigestError::Config("tracker.user_id is not set (PIVOTAL_USER_ID)".into()));
        }
        Ok(())
    }

    /// Check that everything needed to post to the chat channel is present.
    pub fn validate_slack(&self) -> Result<()> {
        if self.slack.token.is_empty() {
            return Err(DigestError::Config("slack.token is not set (SLACK_TOKEN)".into()));
        }
        if self.slack.channel.is_empty() {
            return Err(DigestError::Config("slack.channel is not set (DAILY_SLACK_CHANNEL)".into()));
        }
        Ok(())
    }
}

/// Project tracker (Pivotal Tracker v5) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub project_id: String,
    /// Owner filter applied to the story list request.
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tracker_api_url() -> String { "https://www.pivotaltracker.com/services/v5".into() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: default_tracker_api_url(),
            api_token: String::new(),
            project_id: String::new(),
            user_id: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Slack delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel: String,
    /// Web API method used to post, e.g. "chat.meMessage" or "chat.postMessage".
    #[serde(default = "default_slack_method")]
    pub method: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_slack_api_url() -> String { "https://slack.com/api".into() }
fn default_slack_method() -> String { "chat.meMessage".into() }

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: default_slack_api_url(),
            token: String::new(),
            channel: String::new(),
            method: default_slack_method(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// When the digest fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// "SEC MIN HOUR DOM MON DOW" or "MIN HOUR DOM MON DOW", local time.
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

fn default_cron() -> String { "0 27 22 * * 1-5".into() }
fn default_check_interval_secs() -> u64 { 1 }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

/// How stories are grouped and classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Comments containing this marker are reported alongside their story.
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,
    /// Report stories whose last transition is "started" under "Done:".
    #[serde(default = "bool_true")]
    pub started_counts_as_finished: bool,
    /// Snapshot states that pull an otherwise quiet story into the digest.
    #[serde(default = "default_tracked_states")]
    pub tracked_states: Vec<String>,
}

fn bool_true() -> bool { true }
fn default_comment_marker() -> String { "<=>".into() }
fn default_tracked_states() -> Vec<String> {
    vec!["finished", "started", "rejected"]
        .into_iter().map(String::from).collect()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            comment_marker: default_comment_marker(),
            started_counts_as_finished: true,
            tracked_states: default_tracked_states(),
        }
    }
}
