use std::time::Duration;

use alarm_notifier_core::Payload;

use crate::errors::SlackError;
use crate::notifier::ChatClient;

/// What Slack answered to a successful post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackResponse {
    pub status: reqwest::StatusCode,
    pub body: String,
}

/// Slack incoming-webhook client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackClient {
    /// Create a client posting to `webhook_url`, bounding each request by `timeout`.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, SlackError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }

    /// Post one message to the webhook.
    pub async fn send(&self, payload: &Payload<'_>) -> Result<SlackResponse, SlackError> {
        let resp = self.http.post(&self.webhook_url).json(payload).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(SlackError::Api { status, body });
        }

        Ok(SlackResponse { status, body })
    }
}

impl ChatClient for SlackClient {
    type Response = SlackResponse;
    type Error = SlackError;

    async fn submit(&self, payload: &Payload<'_>) -> Result<SlackResponse, SlackError> {
        self.send(payload).await
    }
}
