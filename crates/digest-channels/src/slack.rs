//! Slack channel — posts the digest through the Web API.

use async_trait::async_trait;
use digest_core::config::SlackConfig;
use digest_core::error::{DigestError, Result};
use digest_core::traits::Notifier;
use serde::Deserialize;

/// Slack Web API notifier.
pub struct SlackNotifier {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DigestError::Notify(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), method)
    }

    /// Send `text` to `channel` using the configured method.
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
        });

        let url = self.api_url(&self.config.method);
        tracing::debug!("POST {url} (channel {channel}, {} chars)", text.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DigestError::Notify(format!("{} failed: {e}", self.config.method)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("⚠️ Slack {} returned {status}", self.config.method);
            return Err(DigestError::Notify(format!("Slack API error {status}: {body}")));
        }

        let result: SlackApiResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Notify(format!("Invalid Slack response: {e}")))?;

        if !result.ok {
            let reason = result.error.unwrap_or_default();
            tracing::warn!("⚠️ Slack {} rejected message to {channel}: {reason}", self.config.method);
            return Err(DigestError::Notify(format!("Send failed: {reason}")));
        }
        tracing::info!("✅ Slack message sent to {channel}");
        Ok(())
    }

    /// Check the token and return the bot's user name.
    pub async fn auth_test(&self) -> Result<String> {
        let response = self
            .client
            .post(self.api_url("auth.test"))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| DigestError::Notify(format!("auth.test failed: {e}")))?;
        let body: SlackApiResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Notify(format!("Invalid auth.test response: {e}")))?;
        if !body.ok {
            return Err(DigestError::Notify(format!(
                "auth.test rejected: {}",
                body.error.unwrap_or_default()
            )));
        }
        body.user
            .ok_or_else(|| DigestError::Notify("No user in auth.test response".into()))
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn post(&self, channel: &str, text: &str) -> Result<()> {
        self.send_message(channel, text).await
    }
}

// --- Slack API Types ---

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<String>,
}
