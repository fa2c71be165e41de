//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON body could not be decoded
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required request field was empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field had a value the backend cannot accept
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Unknown enumeration value (log level, device type)
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
