use std::num::NonZeroUsize;

use aws_lambda_events::event::sns::SnsRecord;
use serde::Serialize;
use tracing::warn;

use crate::model::{AlarmEvent, Severity};

/// Slack accepts at most this many attachments in a single post.
pub const MAX_ATTACHMENTS_PER_MESSAGE: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Icon rendered next to the attachment footer.
pub const FOOTER_ICON_URL: &str = "https://d1d05r7k0qlw4w.cloudfront.net/dist-cbe91c5a8477701757ff6752aae4c6f892018972/img/favicon.ico";

/// One labeled value inside an attachment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: impl ToString) -> Self {
        Self {
            title: title.to_string(),
            value: value.to_string(),
            short: true,
        }
    }
}

/// A Slack message attachment describing one alarm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub color: Severity,
    pub title: String,
    pub text: String,
    pub footer: String,
    pub footer_icon: &'static str,
    /// Unix epoch seconds.
    pub ts: i64,
    pub fields: Vec<AttachmentField>,
}

impl Attachment {
    /// Build the attachment for one alarm.
    ///
    /// `title` is the SNS subject line, `footer` the name of the running function.
    pub fn from_alarm(title: &str, alarm: &AlarmEvent, footer: &str, ts: i64) -> Self {
        let trigger = &alarm.trigger;
        Self {
            color: alarm.severity(),
            title: title.to_string(),
            text: alarm.new_state_reason.clone(),
            footer: footer.to_string(),
            footer_icon: FOOTER_ICON_URL,
            ts,
            fields: vec![
                AttachmentField::short("AccountID", &alarm.aws_account_id),
                AttachmentField::short("Region", &alarm.region),
                AttachmentField::short("Period", trigger.period),
                AttachmentField::short("Threshold", format_threshold(trigger.threshold)),
                AttachmentField::short("Evaluated Periods", trigger.evaluation_periods),
                AttachmentField::short("Comparison Operator", &trigger.comparison_operator),
            ],
        }
    }
}

/// Shortest decimal form of a threshold, switching to exponent notation with a
/// signed two-digit exponent below 1e-4 and from 1e6 up (`1e-05`, `2.5e+07`).
fn format_threshold(threshold: f32) -> String {
    if threshold.is_nan() {
        return "NaN".to_string();
    }
    if threshold.is_infinite() {
        return if threshold > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{threshold:e}");
    match scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| Some((mantissa, exp.parse::<i32>().ok()?)))
    {
        Some((mantissa, exp)) if !(-4..6).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        _ => threshold.to_string(),
    }
}

/// Build one attachment per SNS record, in record order.
///
/// A record whose body cannot be decoded still yields an attachment, built
/// from an empty alarm.
pub fn build_attachments(records: &[SnsRecord], footer: &str, ts: i64) -> Vec<Attachment> {
    records
        .iter()
        .map(|record| {
            let alarm = AlarmEvent::decode(&record.sns.message).unwrap_or_else(|e| {
                warn!(
                    message_id = %record.sns.message_id,
                    error = %e,
                    "undecodable alarm message, sending empty attachment"
                );
                AlarmEvent::default()
            });
            let title = record.sns.subject.as_deref().unwrap_or_default();
            Attachment::from_alarm(title, &alarm, footer, ts)
        })
        .collect()
}

/// Incoming-webhook message body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Payload<'a> {
    pub channel: &'a str,
    pub attachments: &'a [Attachment],
}

impl<'a> Payload<'a> {
    /// Split `attachments` into consecutive messages of at most `chunk_size`
    /// attachments each, all addressed to `channel`.
    pub fn chunked(
        channel: &'a str,
        attachments: &'a [Attachment],
        chunk_size: NonZeroUsize,
    ) -> impl Iterator<Item = Payload<'a>> + 'a {
        attachments
            .chunks(chunk_size.get())
            .map(move |attachments| Payload {
                channel,
                attachments,
            })
    }
}
