//! Error types for the notification pipeline.
//!
//! None of these escape the per-notification boundary: the processor logs
//! them, counts them and moves on to the next notification.

use sonic_sai::SaiError;
use thiserror::Error;

/// Notification processing errors
#[derive(Error, Debug)]
pub enum SyncdError {
    /// Payload is malformed for the notification kind it claims to be
    #[error("Decode error: {0}")]
    Decode(String),

    /// Notification name is none of the recognized kinds
    #[error("Unknown notification: {0}")]
    UnknownEventKind(String),

    /// A RID has no VID yet
    #[error("RID {0} is not present in the local identifier table")]
    TranslationMiss(String),

    /// An FDB batch references unknown identifiers and must not be republished
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// An attribute id has no metadata (fatal for the entry only)
    #[error("Attribute schema error: {0}")]
    AttributeSchema(String),

    /// FDB event type this pipeline does not handle
    #[error("Unsupported event subtype: {0}")]
    UnsupportedEventSubtype(String),

    /// ASIC state store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// A translated event could not be written back to its wire form
    #[error("Encode error: {0}")]
    Encode(String),

    /// Outgoing notification channel is gone
    #[error("Publish error: {0}")]
    Publish(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SaiError> for SyncdError {
    fn from(err: SaiError) -> Self {
        match err {
            SaiError::Decode { .. } | SaiError::InvalidParameter { .. } => {
                SyncdError::Decode(err.to_string())
            }
            SaiError::UnknownNotification { name } => SyncdError::UnknownEventKind(name),
            SaiError::AttributeSchema { .. } => SyncdError::AttributeSchema(err.to_string()),
            SaiError::Encode { .. } => SyncdError::Encode(err.to_string()),
        }
    }
}

/// Result type for notification processing
pub type Result<T> = std::result::Result<T, SyncdError>;
