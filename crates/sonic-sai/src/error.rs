//! SAI error types.
//!
//! Errors raised while interpreting SAI-level data: notification payloads
//! and attribute metadata lookups.

use std::fmt;
use thiserror::Error;

/// Error type for SAI data handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// Payload is malformed for the notification kind it claims to be.
    #[error("failed to decode {kind} notification: {message}")]
    Decode { kind: String, message: String },

    /// Notification name is not one of the recognized kinds.
    #[error("unknown notification: {name}")]
    UnknownNotification { name: String },

    /// An attribute id has no metadata in the schema.
    #[error("no metadata for {object_type} attribute {attr}")]
    AttributeSchema { object_type: String, attr: String },

    /// Invalid parameter (bad textual form of an id, MAC, enum, ...).
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// A value could not be written in its wire form.
    #[error("failed to encode: {message}")]
    Encode { message: String },
}

impl SaiError {
    /// Creates a decode error for the given notification kind.
    pub fn decode(kind: impl Into<String>, message: impl Into<String>) -> Self {
        SaiError::Decode {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown notification error.
    pub fn unknown_notification(name: impl Into<String>) -> Self {
        SaiError::UnknownNotification { name: name.into() }
    }

    /// Creates an attribute schema error.
    pub fn attribute_schema(object_type: impl fmt::Display, attr: impl fmt::Display) -> Self {
        SaiError::AttributeSchema {
            object_type: object_type.to_string(),
            attr: attr.to_string(),
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        SaiError::Encode {
            message: message.into(),
        }
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;
