//! `chat.postMessage` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use tracker::{Block, ChannelId, MessageSink, WatchError};
use zeroize::Zeroizing;

/// Default messaging API root.
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Connection settings for [`SlackClient`].
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// API root, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    blocks: &'a [Block],
}

/// Envelope of every messaging API answer. Failures arrive as HTTP 200 with
/// `ok: false`.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    messages: Vec<String>,
}

impl ApiResponse {
    fn failure_message(&self) -> String {
        let error = self.error.as_deref().unwrap_or("unknown_error");
        match self
            .response_metadata
            .as_ref()
            .and_then(|m| m.messages.first())
        {
            Some(detail) => format!("{error}: {detail}"),
            None => error.to_string(),
        }
    }
}

/// Bot-token client for the messaging service.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: Zeroizing<String>,
}

impl SlackClient {
    /// Creates a client authenticating with the bot `token`.
    ///
    /// # Errors
    ///
    /// [`WatchError::Configuration`] if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: SlackConfig) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WatchError::Configuration {
                message: format!("failed to build messaging HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token.into()),
        })
    }

    fn authorization(&self, channel: &ChannelId) -> Result<HeaderValue, WatchError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.as_str()))
            .map_err(|_| delivery_error(channel, "bot token is not a valid header value", None))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

fn delivery_error(
    channel: &ChannelId,
    message: impl Into<String>,
    raw: Option<serde_json::Value>,
) -> WatchError {
    WatchError::NotificationDelivery {
        channel: channel.clone(),
        message: message.into(),
        raw,
    }
}

#[async_trait]
impl MessageSink for SlackClient {
    #[instrument(skip(self, blocks), fields(channel = %channel, blocks = blocks.len()))]
    async fn post_message(&self, channel: &ChannelId, blocks: &[Block]) -> Result<(), WatchError> {
        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .header(AUTHORIZATION, self.authorization(channel)?)
            .json(&PostMessage {
                channel: channel.as_str(),
                blocks,
            })
            .send()
            .await
            .map_err(|e| delivery_error(channel, format!("request failed: {e}"), None))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| delivery_error(channel, format!("response unreadable: {e}"), None))?;
        let raw: Option<serde_json::Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            return Err(delivery_error(
                channel,
                format!("HTTP {}", status.as_u16()),
                raw.or_else(|| (!body.is_empty()).then(|| serde_json::Value::String(body))),
            ));
        }

        let Some(raw) = raw else {
            return Err(delivery_error(channel, "response is not JSON", None));
        };
        let parsed = ApiResponse::deserialize(&raw)
            .map_err(|e| delivery_error(channel, format!("unexpected response: {e}"), None))?;

        if !parsed.ok {
            return Err(delivery_error(channel, parsed.failure_message(), Some(raw)));
        }

        debug!("Message posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_includes_first_metadata_message() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"ok":false,"error":"invalid_blocks","response_metadata":{"messages":["[ERROR] must be less than 3001 characters"]}}"#,
        )
        .unwrap();
        assert_eq!(
            response.failure_message(),
            "invalid_blocks: [ERROR] must be less than 3001 characters"
        );
    }

    #[test]
    fn failure_message_falls_back_to_error_code() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert_eq!(response.failure_message(), "channel_not_found");
    }
}
