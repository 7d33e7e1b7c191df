use std::fmt;
use std::future::Future;

use alarm_notifier_core::Payload;
use alarm_notifier_core::slack::build_attachments;
use aws_lambda_events::event::sns::SnsRecord;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;

/// Something that can deliver a message to the chat system.
pub trait ChatClient {
    type Response: fmt::Debug;
    type Error: fmt::Display;

    fn submit(
        &self,
        payload: &Payload<'_>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

/// Outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifySummary {
    /// Attachments built, one per record.
    pub attachments: usize,
    pub groups_sent: usize,
    pub groups_failed: usize,
    /// Set when the batch produced no attachments and nothing was posted.
    pub nothing_sent: bool,
}

/// Forward a batch of CloudWatch alarm notifications to Slack.
///
/// 1. Build one attachment per record, in order
/// 2. Split the attachments into messages of at most `config.chunk_size`
/// 3. Post each message in order, logging the outcome; a failed post does not
///    stop the remaining ones and is not retried
///
/// Delivery failures never fail the invocation.
pub async fn handle_alarms<C: ChatClient>(
    records: &[SnsRecord],
    config: &Config,
    client: &C,
) -> NotifySummary {
    let now = Utc::now().timestamp();
    let attachments = build_attachments(records, &config.function_name, now);

    let mut summary = NotifySummary {
        attachments: attachments.len(),
        ..NotifySummary::default()
    };

    if attachments.is_empty() {
        warn!("no slack message sent");
        summary.nothing_sent = true;
        return summary;
    }

    for (group, payload) in Payload::chunked(&config.channel, &attachments, config.chunk_size)
        .enumerate()
    {
        match client.submit(&payload).await {
            Ok(resp) => {
                summary.groups_sent += 1;
                info!(
                    group,
                    attachments = payload.attachments.len(),
                    response = ?resp,
                    "slack message sent"
                );
            }
            Err(e) => {
                summary.groups_failed += 1;
                error!(
                    group,
                    attachments = payload.attachments.len(),
                    error = %e,
                    "failed to send slack message"
                );
            }
        }
    }

    summary
}
