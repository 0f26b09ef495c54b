//! Read-only view of the active session, published after every actor turn.

use std::sync::Arc;
use std::time::Instant;

use core_playback::PlaybackState;
use core_waveform::{
    LaneHeights, SegmentModel, Tween, VisualOffset, WaveformLayout, WaveformSamples,
    WaveformStyle,
};
use provider_media_server::{CoverArt, TrackId};

use crate::session::SessionId;
use crate::synchronizer::{PlayIntent, ScrubState};

/// Everything the player screen renders.
///
/// Each fetched slot carries its own inline error so that a missing cover
/// never hides the waveform or blocks the controls.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub session_id: Option<SessionId>,
    pub track_id: Option<TrackId>,
    pub name: String,
    pub name_error: Option<String>,
    pub duration_secs: u64,
    pub waveform: Arc<WaveformSamples>,
    pub waveform_error: Option<String>,
    pub cover: Option<CoverArt>,
    pub cover_error: Option<String>,
    /// Controls stay disabled until this is set.
    pub sound_loaded: bool,
    pub sound_error: Option<String>,
    /// Last failed play/pause/seek, cleared by the next user action.
    pub control_error: Option<String>,
    pub playback_state: PlaybackState,
    pub scrub_state: ScrubState,
    pub intent: PlayIntent,
    pub offset: VisualOffset,
    pub segment: usize,
    /// Playback time of `segment`, in seconds.
    pub position_secs: f64,
    pub model: SegmentModel,
    pub offset_animation: Option<Tween>,
    pub lanes_animation: Option<Tween>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            track_id: None,
            name: String::new(),
            name_error: None,
            duration_secs: 0,
            waveform: Arc::new(WaveformSamples::empty()),
            waveform_error: None,
            cover: None,
            cover_error: None,
            sound_loaded: false,
            sound_error: None,
            control_error: None,
            playback_state: PlaybackState::Idle,
            scrub_state: ScrubState::Stopped,
            intent: PlayIntent::Paused,
            offset: VisualOffset::ZERO,
            segment: 0,
            position_secs: 0.0,
            model: SegmentModel::default(),
            offset_animation: None,
            lanes_animation: None,
        }
    }
}

impl PlayerSnapshot {
    pub fn controls_enabled(&self) -> bool {
        self.sound_loaded
    }

    pub fn is_playing(&self) -> bool {
        self.scrub_state == ScrubState::Playing
    }

    /// Offset as drawn at `now`.
    pub fn offset_at(&self, now: Instant) -> VisualOffset {
        match self.offset_animation {
            Some(tween) => self.model.clamp_offset(tween.value_at(now)),
            None => self.offset,
        }
    }

    pub fn lanes_at(&self, now: Instant, style: &WaveformStyle) -> LaneHeights {
        blend_lanes(
            style,
            self.lanes_animation.map_or(0.0, |tween| tween.value_at(now)),
        )
    }

    /// Bars to draw for the frame at `now`.
    pub fn layout_at(&self, now: Instant, style: &WaveformStyle) -> WaveformLayout {
        WaveformLayout::compute(
            &self.waveform,
            &self.model,
            style,
            self.lanes_at(now, style),
            self.offset_at(now),
        )
    }

    /// "Current Position: 12s / 200s"
    pub fn position_label(&self) -> String {
        format!(
            "Current Position: {}s / {}s",
            self.position_secs.floor() as u64,
            self.duration_secs
        )
    }
}

/// Lane heights `t` of the way from paused (0.0) to playing (1.0).
pub(crate) fn blend_lanes(style: &WaveformStyle, t: f32) -> LaneHeights {
    let collapsed = style.lanes(false);
    let expanded = style.lanes(true);
    LaneHeights {
        top: collapsed.top + (expanded.top - collapsed.top) * t,
        bottom: collapsed.bottom + (expanded.bottom - collapsed.bottom) * t,
    }
}
