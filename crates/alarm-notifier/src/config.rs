use std::num::NonZeroUsize;
use std::time::Duration;

use alarm_notifier_core::slack::MAX_ATTACHMENTS_PER_MESSAGE;
use aws_config::BehaviorVersion;
use tracing::info;

use crate::errors::ConfigError;

const WEBHOOK_VAR: &str = "SLACK_WEBHOOK";
const WEBHOOK_PARAMETER_VAR: &str = "SLACK_WEBHOOK_PARAMETER";
const CHANNEL_VAR: &str = "SLACK_MONITOR_CHANNEL";
const FUNCTION_NAME_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";
const TIMEOUT_VAR: &str = "SLACK_HTTP_TIMEOUT";

/// Default webhook request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide configuration, loaded once before the first invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slack incoming-webhook URL.
    pub webhook_url: String,
    /// Channel every message is addressed to.
    pub channel: String,
    /// Footer label on each attachment.
    pub function_name: String,
    /// Maximum attachments per posted message.
    pub chunk_size: NonZeroUsize,
    /// Timeout applied to each webhook request.
    pub http_timeout: Duration,
}

/// Where the webhook URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WebhookSource {
    Url(String),
    SsmParameter(String),
}

/// Configuration as read from the environment, before the webhook is resolved.
#[derive(Debug, Clone, PartialEq)]
struct EnvSettings {
    webhook: WebhookSource,
    channel: String,
    function_name: String,
    http_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, fetching the webhook
    /// from SSM Parameter Store when only `SLACK_WEBHOOK_PARAMETER` is set.
    pub async fn load() -> Result<Self, ConfigError> {
        EnvSettings::from_lookup(|key| std::env::var(key).ok())?
            .resolve()
            .await
    }
}

impl EnvSettings {
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook = match non_empty(&lookup, WEBHOOK_VAR)? {
            Some(url) => WebhookSource::Url(url),
            None => match non_empty(&lookup, WEBHOOK_PARAMETER_VAR)? {
                Some(name) => WebhookSource::SsmParameter(name),
                None => return Err(ConfigError::Missing(WEBHOOK_VAR)),
            },
        };

        let channel = non_empty(&lookup, CHANNEL_VAR)?.ok_or(ConfigError::Missing(CHANNEL_VAR))?;

        let function_name = lookup(FUNCTION_NAME_VAR)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        let http_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                parse_timeout(&raw).ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?
            }
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            webhook,
            channel,
            function_name,
            http_timeout,
        })
    }

    async fn resolve(self) -> Result<Config, ConfigError> {
        let webhook_url = match self.webhook {
            WebhookSource::Url(url) => url,
            WebhookSource::SsmParameter(name) => {
                info!(parameter = %name, "loading Slack webhook from SSM");
                fetch_parameter(&name).await?
            }
        };

        Ok(Config {
            webhook_url,
            channel: self.channel,
            function_name: self.function_name,
            chunk_size: MAX_ATTACHMENTS_PER_MESSAGE,
            http_timeout: self.http_timeout,
        })
    }
}

/// Read `key`, treating an unset variable as `None` and a blank one as an error.
fn non_empty<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        other => Ok(other),
    }
}

/// Parse a timeout as `humantime` shorthand ("10s", "1m") or raw seconds.
/// Zero is rejected.
fn parse_timeout(s: &str) -> Option<Duration> {
    let s = s.trim();
    humantime::parse_duration(s)
        .ok()
        .or_else(|| s.parse::<u64>().ok().map(Duration::from_secs))
        .filter(|d| !d.is_zero())
}

/// Fetch and decrypt a SecureString parameter.
async fn fetch_parameter(name: &str) -> Result<String, ConfigError> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let client = aws_sdk_ssm::Client::new(&sdk_config);

    let output = client
        .get_parameter()
        .name(name)
        .with_decryption(true)
        .send()
        .await
        .map_err(aws_sdk_ssm::Error::from)?;

    output
        .parameter
        .and_then(|p| p.value)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingParameterValue(name.to_string()))
}
