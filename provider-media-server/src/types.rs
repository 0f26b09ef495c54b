//! Media server response types

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Numeric track identifier used in every endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl TrackId {
    /// The following track in server order.
    pub fn next(self) -> TrackId {
        TrackId(self.0.saturating_add(1))
    }

    /// The preceding track, if there is one. Ids start at 1.
    pub fn previous(self) -> Option<TrackId> {
        match self.0.checked_sub(1) {
            Some(id) if id > 0 => Some(TrackId(id)),
            _ => None,
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entry of `GET /media_files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub path: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl MediaFile {
    pub fn is_mp3(&self) -> bool {
        self.path.to_ascii_lowercase().ends_with(".mp3")
    }
}

/// Body of `GET /get_name/{id}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NameResponse {
    pub name: String,
}

/// Body of `GET /get_duration/{id}`. Some servers send fractional seconds.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DurationResponse {
    pub duration: f64,
}

/// Downloaded cover image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    /// Final URL after redirects; usable directly as an image source.
    pub url: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}
