use thiserror::Error;

/// Errors decoding an alarm from an SNS message body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message body is empty")]
    Empty,

    #[error("message body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message body is not a JSON object")]
    NotAnObject,
}
