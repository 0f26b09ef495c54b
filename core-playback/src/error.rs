//! # Playback Error Types
//!
//! Decode-side failures of the playback controller. Every variant here is a
//! `DecodeError` from the user's point of view: it is logged, shown next to
//! the playback controls and never retried automatically.

use std::time::Duration;

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Load Errors
    // ========================================================================
    /// The backend could not open the stream (unreachable or unsupported).
    #[error("Failed to load audio: {0}")]
    LoadFailed(String),

    /// The backend reported a failure after the stream was loaded.
    #[error("Decoder failed: {0}")]
    DecoderFailed(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Attempted an operation that needs a loaded handle.
    #[error("No track loaded")]
    NotLoaded,

    /// play/pause/stop was rejected by the backend.
    #[error("Failed to {operation}: {message}")]
    TransportFailed {
        operation: &'static str,
        message: String,
    },

    /// The backend rejected a seek.
    #[error("Failed to seek to {position:?}: {message}")]
    SeekFailed { position: Duration, message: String },

    /// Releasing the decoder failed. The handle is dropped regardless.
    #[error("Failed to release audio: {0}")]
    ReleaseFailed(String),
}

impl PlaybackError {
    pub(crate) fn transport(operation: &'static str, error: BridgeError) -> Self {
        PlaybackError::TransportFailed {
            operation,
            message: bridge_message(error),
        }
    }

    /// Returns `true` if the error came from opening the stream.
    pub fn is_load_error(&self) -> bool {
        matches!(self, PlaybackError::LoadFailed(_))
    }

    /// Returns `true` if the error was caused by the network underneath the
    /// decoder rather than by the audio data.
    pub fn is_network_error(&self) -> bool {
        match self {
            PlaybackError::LoadFailed(message) | PlaybackError::DecoderFailed(message) => {
                let lower = message.to_ascii_lowercase();
                lower.contains("network") || lower.contains("connection") || lower.contains("timed out")
            }
            _ => false,
        }
    }
}

/// Backend errors already carry a category prefix in their display output;
/// strip it for the inline message.
pub(crate) fn bridge_message(error: BridgeError) -> String {
    match error {
        BridgeError::Audio(message)
        | BridgeError::Network(message)
        | BridgeError::OperationFailed(message)
        | BridgeError::NotAvailable(message)
        | BridgeError::Storage(message) => message,
        BridgeError::Io(err) => err.to_string(),
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_message() {
        let err = PlaybackError::transport("pause", BridgeError::Audio("device busy".into()));
        assert_eq!(err.to_string(), "Failed to pause: device busy");
        assert!(!err.is_load_error());
    }

    #[test]
    fn test_network_classification() {
        assert!(PlaybackError::LoadFailed("Connection refused".into()).is_network_error());
        assert!(!PlaybackError::LoadFailed("unsupported codec".into()).is_network_error());
        assert!(!PlaybackError::NotLoaded.is_network_error());
    }
}
