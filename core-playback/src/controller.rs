//! # Playback Controller
//!
//! Owns at most one decoder handle from an [`AudioBackend`] and tracks its
//! [`PlaybackState`].
//!
//! ```text
//!            load()             play()
//!   Idle ──▶ Loading ──▶ Stopped ──▶ Playing ◀──▶ Paused
//!              │            ▲           │  Finished     │
//!              ▼ error      └── stop() ─┴──▶ Ended ◀────┘
//!            Idle
//! ```
//!
//! Transport calls made in a state where they make no sense are no-ops
//! rather than errors; callers gate on [`PlaybackController::state`].
//!
//! Every call can also be split in two: [`PlaybackController::prepare`]
//! checks the state and returns a [`TransportCall`] that can run on any
//! task, and [`PlaybackController::complete`] applies its outcome later.
//! Completion and failure notifications arrive asynchronously through the
//! backend callback and are fed back with
//! [`PlaybackController::on_audio_event`].

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::playback::{
    AudioBackend, AudioEvent, AudioEventCallback, AudioEventKind, AudioHandleId, AudioSource,
    LoadedAudio,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{bridge_message, PlaybackError, Result};

/// Durations at or below this are treated as unknown.
const MIN_REPORTED_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
    Ended,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

/// One decoder call on a loaded handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportOp {
    Play,
    Pause,
    Stop,
    Seek(Duration),
    /// Unload the handle.
    Release,
}

/// A backend call prepared by [`PlaybackController::prepare`].
///
/// Running it touches only the backend, so it can be moved to another task
/// while the controller keeps serving requests.
pub struct TransportCall {
    backend: Arc<dyn AudioBackend>,
    handle: AudioHandleId,
    op: TransportOp,
    previous: PlaybackState,
    target: PlaybackState,
}

impl TransportCall {
    pub fn op(&self) -> TransportOp {
        self.op
    }

    pub fn handle(&self) -> AudioHandleId {
        self.handle
    }

    pub async fn run(self) -> TransportOutcome {
        let handle = self.handle;
        let result = match self.op {
            TransportOp::Play => self
                .backend
                .play(handle)
                .await
                .map_err(|e| PlaybackError::transport("play", e)),
            TransportOp::Pause => self
                .backend
                .pause(handle)
                .await
                .map_err(|e| PlaybackError::transport("pause", e)),
            TransportOp::Stop => self
                .backend
                .stop(handle)
                .await
                .map_err(|e| PlaybackError::transport("stop", e)),
            TransportOp::Seek(position) => self
                .backend
                .seek(handle, position)
                .await
                .map_err(|e| PlaybackError::SeekFailed {
                    position,
                    message: bridge_message(e),
                }),
            TransportOp::Release => self
                .backend
                .unload(handle)
                .await
                .map_err(|e| PlaybackError::ReleaseFailed(bridge_message(e))),
        };

        TransportOutcome {
            handle,
            op: self.op,
            previous: self.previous,
            target: self.target,
            result,
        }
    }
}

impl std::fmt::Debug for TransportCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportCall")
            .field("handle", &self.handle)
            .field("op", &self.op)
            .finish()
    }
}

/// Result of a [`TransportCall`], handed back to
/// [`PlaybackController::complete`].
#[derive(Debug)]
pub struct TransportOutcome {
    pub handle: AudioHandleId,
    pub op: TransportOp,
    previous: PlaybackState,
    target: PlaybackState,
    pub result: Result<()>,
}

/// Whole seconds of a decoder-reported duration, if it is meaningful.
pub fn usable_duration(reported: Option<Duration>) -> Option<u64> {
    reported
        .filter(|d| *d > MIN_REPORTED_DURATION)
        .map(|d| d.as_secs())
}

pub struct PlaybackController {
    backend: Arc<dyn AudioBackend>,
    handle: Option<AudioHandleId>,
    duration: Option<Duration>,
    state: PlaybackState,
}

impl PlaybackController {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            handle: None,
            duration: None,
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn handle(&self) -> Option<AudioHandleId> {
        self.handle
    }

    /// Duration reported by the decoder for the loaded stream.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Load `source`, releasing any handle held so far.
    pub async fn load(
        &mut self,
        source: AudioSource,
        on_event: AudioEventCallback,
    ) -> Result<AudioHandleId> {
        if let Err(err) = self.dispose().await {
            warn!(error = %err, "Previous handle not released cleanly");
        }
        self.mark_loading();

        match Self::acquire(self.backend.clone(), source, on_event).await {
            Ok(loaded) => {
                let handle = loaded.handle;
                if let Some(displaced) = self.attach(loaded) {
                    if let Err(err) = displaced.run().await.result {
                        warn!(error = %err, "Previous handle not released cleanly");
                    }
                }
                Ok(handle)
            }
            Err(err) => {
                self.state = PlaybackState::Idle;
                Err(err)
            }
        }
    }

    /// Open a stream without touching any controller.
    ///
    /// Used by callers that run the load on a separate task and hand the
    /// result back with [`PlaybackController::attach`].
    #[instrument(skip(backend, on_event), fields(url = %source.url()))]
    pub async fn acquire(
        backend: Arc<dyn AudioBackend>,
        source: AudioSource,
        on_event: AudioEventCallback,
    ) -> Result<LoadedAudio> {
        let loaded = backend
            .load(source, on_event)
            .await
            .map_err(|e| PlaybackError::LoadFailed(bridge_message(e)))?;

        info!(handle = %loaded.handle, duration = ?loaded.duration, "Audio loaded");
        Ok(loaded)
    }

    /// Record that a load for this controller is in flight.
    pub fn mark_loading(&mut self) {
        self.state = PlaybackState::Loading;
    }

    /// Record that the in-flight load failed.
    pub fn mark_load_failed(&mut self) {
        if self.handle.is_none() {
            self.state = PlaybackState::Idle;
        }
    }

    /// Take ownership of a handle produced by [`PlaybackController::acquire`].
    ///
    /// A handle that was already held is detached and returned as a release
    /// call for the caller to run.
    pub fn attach(&mut self, loaded: LoadedAudio) -> Option<TransportCall> {
        let displaced = self.release_call();
        self.handle = Some(loaded.handle);
        self.duration = loaded.duration;
        self.state = PlaybackState::Stopped;
        displaced
    }

    pub async fn play(&mut self) -> Result<()> {
        self.issue(TransportOp::Play).await
    }

    pub async fn pause(&mut self) -> Result<()> {
        self.issue(TransportOp::Pause).await
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.issue(TransportOp::Stop).await
    }

    /// Reposition the decoder. Allowed while playing, paused, stopped or
    /// ended; a playing handle keeps playing.
    pub async fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.issue(TransportOp::Seek(position)).await
    }

    /// Prepare a backend call for `op` without issuing it.
    ///
    /// The state moves to its target right away so that later requests gate
    /// on the intended state; [`PlaybackController::complete`] rolls it back
    /// if the backend rejects the call. `Ok(None)` means `op` is a no-op in
    /// the current state.
    pub fn prepare(&mut self, op: TransportOp) -> Result<Option<TransportCall>> {
        let Some(handle) = self.handle else {
            if let TransportOp::Seek(_) = op {
                return Err(PlaybackError::NotLoaded);
            }
            debug!(?op, state = ?self.state, "Transport call ignored");
            return Ok(None);
        };

        let previous = self.state;
        let (op, target) = match op {
            TransportOp::Release => return Ok(self.release_call()),
            TransportOp::Play => match previous {
                PlaybackState::Paused | PlaybackState::Stopped | PlaybackState::Ended => {
                    (op, PlaybackState::Playing)
                }
                _ => return Ok(None),
            },
            TransportOp::Pause if previous == PlaybackState::Playing => (op, PlaybackState::Paused),
            TransportOp::Stop if matches!(previous, PlaybackState::Playing | PlaybackState::Paused) => {
                (op, PlaybackState::Stopped)
            }
            TransportOp::Pause | TransportOp::Stop => return Ok(None),
            TransportOp::Seek(position) => {
                let position = match self.duration {
                    Some(duration) if position > duration => duration,
                    _ => position,
                };
                let target = match previous {
                    PlaybackState::Ended => PlaybackState::Paused,
                    state => state,
                };
                (TransportOp::Seek(position), target)
            }
        };

        self.state = target;
        Ok(Some(TransportCall {
            backend: self.backend.clone(),
            handle,
            op,
            previous,
            target,
        }))
    }

    /// Apply the result of a call produced by [`PlaybackController::prepare`].
    pub fn complete(&mut self, outcome: &TransportOutcome) {
        if self.handle != Some(outcome.handle) {
            return;
        }
        match &outcome.result {
            Ok(()) => {
                debug!(op = ?outcome.op, state = ?self.state, "Transport call done");
            }
            Err(_) if self.state == outcome.target => {
                self.state = outcome.previous;
            }
            Err(_) => {}
        }
    }

    async fn issue(&mut self, op: TransportOp) -> Result<()> {
        let Some(call) = self.prepare(op)? else {
            return Ok(());
        };
        let outcome = call.run().await;
        self.complete(&outcome);
        outcome.result
    }

    /// Detach the held handle, if any, and return the call that unloads it.
    pub fn release_call(&mut self) -> Option<TransportCall> {
        let handle = self.handle.take()?;
        debug!(%handle, "Releasing audio handle");
        let previous = self.state;
        self.duration = None;
        self.state = PlaybackState::Idle;
        Some(TransportCall {
            backend: self.backend.clone(),
            handle,
            op: TransportOp::Release,
            previous,
            target: PlaybackState::Idle,
        })
    }

    /// Apply a backend notification. Returns the event kind when it belongs
    /// to the live handle, `None` for notifications about released handles.
    pub fn on_audio_event(&mut self, event: &AudioEvent) -> Option<AudioEventKind> {
        if self.handle != Some(event.handle) {
            debug!(handle = %event.handle, "Ignoring event for released handle");
            return None;
        }

        match &event.kind {
            AudioEventKind::Finished => {
                self.state = PlaybackState::Ended;
            }
            AudioEventKind::Failed(message) => {
                warn!(%message, "Decoder reported failure");
                self.state = PlaybackState::Stopped;
            }
        }
        Some(event.kind.clone())
    }

    /// Release the decoder. Safe to call repeatedly.
    pub async fn dispose(&mut self) -> Result<()> {
        let result = self.issue(TransportOp::Release).await;
        self.duration = None;
        self.state = PlaybackState::Idle;
        result
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            warn!(%handle, "PlaybackController dropped without dispose()");
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("handle", &self.handle)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .finish()
    }
}
