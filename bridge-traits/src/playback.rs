//! Audio backend bridge.
//!
//! The core never decodes audio itself. Hosts plug in an [`AudioBackend`]
//! (expo-av, AVPlayer, ExoPlayer, rodio, ...) that streams a source by
//! reference and reports asynchronous completion through a callback.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::Result;

/// Audio reference handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Remote HTTP(S) stream fetched by the host.
    RemoteStream {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl AudioSource {
    /// Remote stream without extra headers.
    pub fn remote(url: impl Into<String>) -> Self {
        AudioSource::RemoteStream {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            AudioSource::RemoteStream { url, .. } => url,
        }
    }
}

/// Identifier of one decoder resource held by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandleId(Uuid);

impl AudioHandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AudioHandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AudioHandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a successful [`AudioBackend::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAudio {
    pub handle: AudioHandleId,
    /// Duration reported by the decoder, when it knows it.
    pub duration: Option<Duration>,
}

/// What happened to a loaded handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEventKind {
    /// Playback reached the end of the stream.
    Finished,
    /// The decoder failed after loading (network drop, corrupt frame, ...).
    Failed(String),
}

/// Notification delivered off the caller's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEvent {
    pub handle: AudioHandleId,
    pub kind: AudioEventKind,
}

impl AudioEvent {
    pub fn finished(handle: AudioHandleId) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Finished,
        }
    }

    pub fn failed(handle: AudioHandleId, message: impl Into<String>) -> Self {
        Self {
            handle,
            kind: AudioEventKind::Failed(message.into()),
        }
    }
}

/// Callback invoked by the backend for every [`AudioEvent`] of a handle.
pub type AudioEventCallback = Arc<dyn Fn(AudioEvent) + Send + Sync>;

/// Opaque decoder capability supplied by the host.
///
/// Every method may suspend. Errors are reported as
/// [`BridgeError::Audio`](crate::error::BridgeError::Audio) so the core can
/// classify them as decode failures.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire a decoder for `source`. Events for the returned handle are
    /// delivered through `on_event` until [`AudioBackend::unload`] is called.
    async fn load(&self, source: AudioSource, on_event: AudioEventCallback)
        -> Result<LoadedAudio>;

    /// Begin or resume playback.
    async fn play(&self, handle: AudioHandleId) -> Result<()>;

    /// Pause without releasing the decoder.
    async fn pause(&self, handle: AudioHandleId) -> Result<()>;

    /// Stop and rewind to the start.
    async fn stop(&self, handle: AudioHandleId) -> Result<()>;

    /// Reposition to an absolute position. Playing handles keep playing.
    async fn seek(&self, handle: AudioHandleId, position: Duration) -> Result<()>;

    /// Release the decoder resource.
    async fn unload(&self, handle: AudioHandleId) -> Result<()>;
}
