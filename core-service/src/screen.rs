//! Navigation parameters of the player screen.

use provider_media_server::{MediaFile, TrackId};
use serde::{Deserialize, Serialize};

/// `{ trackId, trackName }` passed when the home list opens the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScreenParams {
    pub track_id: TrackId,
    /// Shown until the server's name for the track arrives.
    pub track_name: String,
}

impl PlayerScreenParams {
    pub fn new(track_id: TrackId, track_name: impl Into<String>) -> Self {
        Self {
            track_id,
            track_name: track_name.into(),
        }
    }
}

impl From<&MediaFile> for PlayerScreenParams {
    fn from(file: &MediaFile) -> Self {
        Self::new(file.id, file.name.clone())
    }
}
