use core_playback::PlaybackError;
use provider_media_server::MediaServerError;
use thiserror::Error;

use crate::session::SessionId;

#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error(transparent)]
    Network(#[from] MediaServerError),

    #[error("Decode error: {0}")]
    Decode(String),

    /// A late result from a superseded session. Never shown to the user.
    #[error("Stale result ignored: expected session {expected}, got {got}")]
    StaleResultIgnored { expected: SessionId, got: SessionId },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Player actor has stopped")]
    Stopped,
}

impl From<PlaybackError> for SessionError {
    fn from(err: PlaybackError) -> Self {
        SessionError::Decode(err.to_string())
    }
}

impl SessionError {
    /// Whether the error belongs in an inline message on screen.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SessionError::Network(_) | SessionError::Decode(_))
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, SessionError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let stale = SessionError::StaleResultIgnored {
            expected: SessionId::new(2),
            got: SessionId::new(1),
        };
        assert!(!stale.is_user_visible());
        assert_eq!(
            stale.to_string(),
            "Stale result ignored: expected session 2, got 1"
        );

        let net = SessionError::from(MediaServerError::Network("refused".into()));
        assert!(net.is_user_visible());
        assert!(net.is_network_error());

        let decode = SessionError::from(PlaybackError::NotLoaded);
        assert!(decode.is_user_visible());
        assert!(!decode.is_network_error());
    }
}
