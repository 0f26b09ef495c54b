//! Error types for the media server client

use thiserror::Error;

/// Failures talking to the media server. All of them are network errors
/// from the player's point of view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaServerError {
    /// Transport failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("Media server error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Base URL is unusable
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl MediaServerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaServerError::ApiError { status_code: 404, .. })
    }
}

impl From<bridge_traits::error::BridgeError> for MediaServerError {
    fn from(error: bridge_traits::error::BridgeError) -> Self {
        match error {
            bridge_traits::error::BridgeError::Network(msg) => MediaServerError::Network(msg),
            other => MediaServerError::Network(other.to_string()),
        }
    }
}

/// Result type for media server operations
pub type Result<T> = std::result::Result<T, MediaServerError>;
