//! Per-track session arena.
//!
//! A [`TrackSession`] is created by every switch and discarded wholesale by
//! the next one. Nothing inside it outlives the switch: the cancellation
//! token stops its fetches and ticker, and the controller is disposed.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use core_playback::{PlaybackController, TransportOp};
use core_runtime::config::PlayerConfig;
use core_waveform::{SegmentModel, WaveformSamples};
use provider_media_server::{CoverArt, TrackId};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::snapshot::PlayerSnapshot;
use crate::synchronizer::ScrubSynchronizer;
use crate::ticker::Ticker;
use crate::transport::TransportQueue;

/// Current time on the runtime clock, so paused test time applies.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Identity of one switch. Monotonic for the lifetime of the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct TrackSession {
    pub id: SessionId,
    pub track_id: TrackId,
    pub name: String,
    pub name_error: Option<String>,
    pub duration_secs: u64,
    /// Set once the decoder reported a usable duration; the server value
    /// no longer applies after that.
    pub decoder_duration: bool,
    pub duration_failed: bool,
    pub waveform: Arc<WaveformSamples>,
    pub waveform_error: Option<String>,
    pub cover: Option<CoverArt>,
    pub cover_error: Option<String>,
    pub sound_error: Option<String>,
    pub control_error: Option<String>,
    pub controller: PlaybackController,
    pub sync: ScrubSynchronizer,
    pub token: CancellationToken,
    pub transport: TransportQueue,
    pub ticker: Option<Ticker>,
    pub tick_generation: u64,
}

impl TrackSession {
    pub fn new(
        id: SessionId,
        track_id: TrackId,
        name: String,
        config: &PlayerConfig,
        model: SegmentModel,
        token: CancellationToken,
        transport: TransportQueue,
    ) -> Self {
        let mut controller = PlaybackController::new(config.audio_backend.clone());
        controller.mark_loading();

        Self {
            id,
            track_id,
            name,
            name_error: None,
            duration_secs: 0,
            decoder_duration: false,
            duration_failed: false,
            waveform: Arc::new(WaveformSamples::empty()),
            waveform_error: None,
            cover: None,
            cover_error: None,
            sound_error: None,
            control_error: None,
            controller,
            sync: ScrubSynchronizer::new(model, config.ease_duration, config.end_behavior, now()),
            token,
            transport,
            ticker: None,
            tick_generation: 0,
        }
    }

    pub fn set_duration_secs(&mut self, secs: u64) {
        self.duration_secs = secs;
        self.sync.set_duration(Duration::from_secs(secs));
    }

    /// The server could not say how long the track is and the loaded
    /// decoder could not either.
    pub fn duration_unavailable(&self) -> bool {
        self.duration_failed && self.sync.is_ready() && !self.decoder_duration
    }

    /// Queue the decoder call for `op`. A no-op in the current playback
    /// state queues nothing.
    pub fn issue(&mut self, op: TransportOp) -> core_playback::Result<()> {
        if let Some(call) = self.controller.prepare(op)? {
            self.transport.push(call);
        }
        Ok(())
    }

    pub fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    /// True if a tick for `generation` comes from the running ticker.
    pub fn is_live_tick(&self, generation: u64) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| ticker.generation() == generation)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            session_id: Some(self.id),
            track_id: Some(self.track_id),
            name: self.name.clone(),
            name_error: self.name_error.clone(),
            duration_secs: self.duration_secs,
            waveform: self.waveform.clone(),
            waveform_error: self.waveform_error.clone(),
            cover: self.cover.clone(),
            cover_error: self.cover_error.clone(),
            sound_loaded: self.sync.is_ready(),
            sound_error: self.sound_error.clone(),
            control_error: self.control_error.clone(),
            playback_state: self.controller.state(),
            scrub_state: self.sync.state(),
            intent: self.sync.intent(),
            offset: self.sync.offset(),
            segment: self.sync.segment(),
            position_secs: self.sync.position().as_secs_f64(),
            model: *self.sync.model(),
            offset_animation: Some(self.sync.animation()),
            lanes_animation: Some(self.sync.lanes_animation()),
        }
    }
}
