//! Backend call errors

use protocol::{ProtocolError, Severity};
use thiserror::Error;

/// Why a backend call did not succeed
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required input missing or malformed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Backend answered `success: false`
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Backend redirected to its login page
    #[error("Not logged in to the backend, check [backend] credentials")]
    Unauthorized,

    /// Connection, timeout or TLS failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not the expected JSON envelope
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl ApiError {
    /// Toast severity for this failure
    pub fn severity(&self) -> Severity {
        match self {
            ApiError::Validation(_) | ApiError::Unauthorized => Severity::Warning,
            ApiError::Rejected { status, .. } if (400..500).contains(status) => Severity::Warning,
            ApiError::Rejected { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                Severity::Danger
            }
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Json(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Validation(other.to_string()),
        }
    }
}
