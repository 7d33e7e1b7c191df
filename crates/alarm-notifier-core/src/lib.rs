pub mod error;
pub mod model;
pub mod slack;

pub use error::DecodeError;
pub use model::{AlarmEvent, Severity, Trigger};
pub use slack::{Attachment, AttachmentField, Payload};
