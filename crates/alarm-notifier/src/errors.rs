/// Errors from the Slack incoming webhook.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    /// HTTP transport error, timeouts included.
    #[error("Slack HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Slack answered with a non-success status.
    #[error("Slack API error: status={status}, body={body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Errors loading configuration at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} is empty")]
    Empty(&'static str),
    #[error("invalid SLACK_HTTP_TIMEOUT {0:?}")]
    InvalidTimeout(String),
    #[error("SSM error: {0}")]
    Ssm(#[from] aws_sdk_ssm::Error),
    #[error("SSM parameter {0} has no value")]
    MissingParameterValue(String),
}
