mod config;
mod errors;
mod notifier;
mod slack;

use aws_lambda_events::event::sns::SnsEvent;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::slack::SlackClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = Config::load().await?;
    let client = SlackClient::new(&config.webhook_url, config.http_timeout)?;
    info!(
        channel = %config.channel,
        chunk_size = config.chunk_size.get(),
        "alarm notifier starting"
    );

    let config = &config;
    let client = &client;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<SnsEvent>| async move {
        let records = event.payload.records;
        info!(
            request_id = %event.context.request_id,
            records = records.len(),
            "received alarm batch"
        );

        let summary = notifier::handle_alarms(&records, config, client).await;
        info!(
            attachments = summary.attachments,
            groups_sent = summary.groups_sent,
            groups_failed = summary.groups_failed,
            nothing_sent = summary.nothing_sent,
            "alarm batch done"
        );
        Ok::<(), Error>(())
    }))
    .await
}
