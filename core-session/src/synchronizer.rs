//! # Scrub Synchronizer
//!
//! Owns the authoritative [`VisualOffset`] of one track session and decides
//! who may move it: the periodic tick while playing, or the user's finger
//! while dragging. Never both.
//!
//! ```text
//!                 toggle (ready)              drag_begin
//!     Stopped ◀──────────────────▶ Playing ──────────────▶ Dragging
//!        │                            ▲                      │
//!        │ drag_begin                 │ drag_end             │ drag_end
//!        └──────────▶ Dragging ───────┘ (intent = Playing)   ▼ (intent = Paused)
//!                                                         Stopped
//! ```
//!
//! The synchronizer performs no I/O. Every input returns a list of
//! [`SyncEffect`]s that the session actor carries out in order, which keeps
//! the whole state machine testable with plain `Instant`s.

use std::time::{Duration, Instant};

use core_runtime::config::EndBehavior;
use core_waveform::{Easing, LaneHeights, SegmentModel, Tween, VisualOffset, WaveformStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::snapshot::blend_lanes;

/// Who currently owns offset mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrubState {
    Stopped,
    Playing,
    Dragging,
}

/// What the user asked for with the last tap. Single source of truth for
/// "should be playing"; decoder state never writes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayIntent {
    Playing,
    #[default]
    Paused,
}

impl PlayIntent {
    fn flipped(self) -> Self {
        match self {
            PlayIntent::Playing => PlayIntent::Paused,
            PlayIntent::Paused => PlayIntent::Playing,
        }
    }
}

/// Side effect requested by the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEffect {
    Play,
    Pause,
    /// Reposition the decoder. `replayed` marks a seek that was queued
    /// while the decoder was still loading.
    Seek {
        segment: usize,
        position: Duration,
        replayed: bool,
    },
    StartTicker,
    StopTicker,
    /// Switch to the next track.
    AdvanceTrack,
    DragStarted {
        offset: VisualOffset,
    },
    DragEnded {
        segment: usize,
    },
    SeekQueued {
        segment: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ScrubSynchronizer {
    model: SegmentModel,
    ease: Duration,
    end_behavior: EndBehavior,
    offset: VisualOffset,
    animation: Tween,
    /// 0.0 = collapsed (paused) lanes, 1.0 = expanded (playing) lanes
    lanes: Tween,
    intent: PlayIntent,
    drag_origin: Option<VisualOffset>,
    duration: Duration,
    ready: bool,
    pending_seek: Option<usize>,
}

impl ScrubSynchronizer {
    pub fn new(
        model: SegmentModel,
        ease: Duration,
        end_behavior: EndBehavior,
        now: Instant,
    ) -> Self {
        Self {
            model,
            ease,
            end_behavior,
            offset: VisualOffset::ZERO,
            animation: Tween::settled(0.0, now),
            lanes: Tween::settled(0.0, now),
            intent: PlayIntent::Paused,
            drag_origin: None,
            duration: Duration::ZERO,
            ready: false,
            pending_seek: None,
        }
    }

    pub fn state(&self) -> ScrubState {
        if self.drag_origin.is_some() {
            ScrubState::Dragging
        } else if self.ready && self.intent == PlayIntent::Playing {
            ScrubState::Playing
        } else {
            ScrubState::Stopped
        }
    }

    pub fn intent(&self) -> PlayIntent {
        self.intent
    }

    pub fn model(&self) -> &SegmentModel {
        &self.model
    }

    /// Resting offset, i.e. where the current animation ends.
    pub fn offset(&self) -> VisualOffset {
        self.offset
    }

    /// Offset as drawn at `now`, part way through any glide.
    pub fn displayed_offset(&self, now: Instant) -> VisualOffset {
        self.model.clamp_offset(self.animation.value_at(now))
    }

    pub fn animation(&self) -> Tween {
        self.animation
    }

    pub fn lanes_animation(&self) -> Tween {
        self.lanes
    }

    pub fn segment(&self) -> usize {
        self.model.segment_for_offset(self.offset)
    }

    /// Playback time of the current segment.
    pub fn position(&self) -> Duration {
        self.model.time_for_segment(self.segment(), self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_seek(&self) -> Option<usize> {
        self.pending_seek
    }

    /// Tick cadence: `fixed` when configured, otherwise one segment of
    /// track time. `None` while the duration is unknown.
    pub fn tick_period(&self, fixed: Option<Duration>) -> Option<Duration> {
        fixed
            .or_else(|| Some(self.model.segment_duration(self.duration)))
            .filter(|period| !period.is_zero())
    }

    /// Lane heights at `now`, interpolated between the paused and playing
    /// heights of `style`.
    pub fn lanes_at(&self, now: Instant, style: &WaveformStyle) -> LaneHeights {
        blend_lanes(style, self.lanes.value_at(now))
    }

    /// One automatic advance. Ignored unless playing.
    pub fn tick(&mut self, now: Instant) -> Vec<SyncEffect> {
        if self.state() != ScrubState::Playing {
            trace!(state = ?self.state(), "Tick ignored");
            return Vec::new();
        }

        if self.model.is_exhausted(self.offset) {
            self.offset = self.model.clamp_offset(self.offset.px());
            debug!("Waveform exhausted, advancement stops");
            return vec![SyncEffect::StopTicker];
        }

        self.offset = self.model.advance(self.offset);
        self.glide_to(self.offset, now);
        Vec::new()
    }

    pub fn drag_begin(&mut self, now: Instant) -> Vec<SyncEffect> {
        if self.drag_origin.is_some() {
            return Vec::new();
        }
        let was_playing = self.state() == ScrubState::Playing;

        let origin = self.displayed_offset(now);
        self.offset = origin;
        self.animation = Tween::settled(origin.px(), now);
        self.drag_origin = Some(origin);

        let mut effects = Vec::with_capacity(2);
        if was_playing {
            effects.push(SyncEffect::StopTicker);
        }
        effects.push(SyncEffect::DragStarted { offset: origin });
        effects
    }

    /// Follow the finger. `dx` is the total translation since the drag began.
    pub fn drag_update(&mut self, dx: f32, now: Instant) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        self.offset = self.model.clamp_offset(origin.px() + dx);
        self.animation = Tween::settled(self.offset.px(), now);
    }

    /// Snap to the nearest segment and issue one seek, or queue it while the
    /// decoder is still loading.
    pub fn drag_end(&mut self, now: Instant) -> Vec<SyncEffect> {
        if self.drag_origin.take().is_none() {
            return Vec::new();
        }

        let segment = self.model.segment_for_offset(self.offset);
        self.offset = self.model.offset_for_segment(segment);
        self.glide_to(self.offset, now);

        let mut effects = vec![SyncEffect::DragEnded { segment }];
        if self.ready {
            self.pending_seek = None;
            effects.push(self.seek(segment, false));
        } else {
            self.pending_seek = Some(segment);
            effects.push(SyncEffect::SeekQueued { segment });
        }

        if self.state() == ScrubState::Playing {
            effects.push(SyncEffect::StartTicker);
        }
        effects
    }

    /// Flip the play intent. Ignored until the decoder is ready.
    pub fn toggle(&mut self, now: Instant) -> Vec<SyncEffect> {
        if !self.ready {
            debug!("Toggle ignored before sound is loaded");
            return Vec::new();
        }

        self.set_intent(self.intent.flipped(), now);
        match self.intent {
            PlayIntent::Playing => {
                let mut effects = vec![SyncEffect::Play];
                if self.drag_origin.is_none() {
                    effects.push(SyncEffect::StartTicker);
                }
                effects
            }
            PlayIntent::Paused => vec![SyncEffect::Pause, SyncEffect::StopTicker],
        }
    }

    /// Decoder is ready. Replays a queued seek.
    pub fn on_loaded(&mut self, decoder_duration: Option<Duration>) -> Vec<SyncEffect> {
        self.ready = true;
        if let Some(duration) = decoder_duration {
            self.duration = duration;
        }

        match self.pending_seek.take() {
            Some(segment) => vec![self.seek(segment, true)],
            None => Vec::new(),
        }
    }

    /// Loading failed; a queued seek has nothing to apply to.
    pub fn on_load_failed(&mut self) {
        if let Some(segment) = self.pending_seek.take() {
            debug!(segment, "Dropping queued seek");
        }
    }

    /// The decoder reached the end of the track.
    pub fn on_ended(&mut self, now: Instant) -> Vec<SyncEffect> {
        if self.drag_origin.is_some() {
            // The gesture owns the offset; drag_end will seek.
            self.set_intent(PlayIntent::Paused, now);
            return Vec::new();
        }

        self.offset = VisualOffset::ZERO;
        self.glide_to(self.offset, now);

        match self.end_behavior {
            EndBehavior::Stop => {
                self.set_intent(PlayIntent::Paused, now);
                vec![SyncEffect::StopTicker, self.seek(0, false)]
            }
            EndBehavior::Repeat => {
                self.set_intent(PlayIntent::Playing, now);
                vec![
                    self.seek(0, false),
                    SyncEffect::Play,
                    SyncEffect::StartTicker,
                ]
            }
            EndBehavior::Advance => {
                self.set_intent(PlayIntent::Paused, now);
                vec![SyncEffect::StopTicker, SyncEffect::AdvanceTrack]
            }
        }
    }

    /// A transport call or the decoder failed; fall back to paused.
    pub fn halt(&mut self, now: Instant) -> Vec<SyncEffect> {
        self.set_intent(PlayIntent::Paused, now);
        vec![SyncEffect::StopTicker]
    }

    fn seek(&self, segment: usize, replayed: bool) -> SyncEffect {
        SyncEffect::Seek {
            segment,
            position: self.model.time_for_segment(segment, self.duration),
            replayed,
        }
    }

    fn glide_to(&mut self, offset: VisualOffset, now: Instant) {
        self.animation = self.animation.retarget(offset.px(), now, self.ease);
    }

    fn set_intent(&mut self, intent: PlayIntent, now: Instant) {
        self.intent = intent;
        let target = match intent {
            PlayIntent::Playing => 1.0,
            PlayIntent::Paused => 0.0,
        };
        self.lanes = Tween::new(
            self.lanes.value_at(now),
            target,
            now,
            self.ease,
            Easing::InOutQuad,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EASE: Duration = Duration::from_millis(300);

    fn sync(end: EndBehavior) -> (ScrubSynchronizer, Instant) {
        let now = Instant::now();
        (
            ScrubSynchronizer::new(SegmentModel::default(), EASE, end, now),
            now,
        )
    }

    fn loaded(seconds: u64) -> (ScrubSynchronizer, Instant) {
        let (mut s, now) = sync(EndBehavior::Stop);
        assert!(s.on_loaded(Some(Duration::from_secs(seconds))).is_empty());
        (s, now)
    }

    fn seeks(effects: &[SyncEffect]) -> Vec<Duration> {
        effects
            .iter()
            .filter_map(|e| match e {
                SyncEffect::Seek { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let (s, now) = sync(EndBehavior::Stop);
        assert_eq!(s.state(), ScrubState::Stopped);
        assert_eq!(s.intent(), PlayIntent::Paused);
        assert_eq!(s.offset(), VisualOffset::ZERO);
        assert_eq!(s.displayed_offset(now), VisualOffset::ZERO);
        assert!(!s.is_ready());
    }

    #[test]
    fn test_toggle_before_load_is_ignored() {
        let (mut s, now) = sync(EndBehavior::Stop);
        assert!(s.toggle(now).is_empty());
        assert_eq!(s.intent(), PlayIntent::Paused);
    }

    #[test]
    fn test_toggle_pushes_intent_to_controller() {
        let (mut s, now) = loaded(200);

        assert_eq!(
            s.toggle(now),
            vec![SyncEffect::Play, SyncEffect::StartTicker]
        );
        assert_eq!(s.state(), ScrubState::Playing);

        assert_eq!(
            s.toggle(now),
            vec![SyncEffect::Pause, SyncEffect::StopTicker]
        );
        assert_eq!(s.state(), ScrubState::Stopped);
    }

    #[test]
    fn test_tick_advances_one_segment_with_easing() {
        let (mut s, now) = loaded(200);
        s.toggle(now);

        assert!(s.tick(now).is_empty());
        assert_eq!(s.offset().px(), -5.0);
        assert_eq!(s.segment(), 1);

        // Mid-glide the drawn offset sits between the old and new segment.
        let mid = s.displayed_offset(now + EASE / 2).px();
        assert!(mid < 0.0 && mid > -5.0);
        assert_eq!(s.displayed_offset(now + EASE).px(), -5.0);
    }

    #[test]
    fn test_tick_ignored_while_paused() {
        let (mut s, now) = loaded(200);
        assert!(s.tick(now).is_empty());
        assert_eq!(s.offset(), VisualOffset::ZERO);
    }

    #[test]
    fn test_tick_during_drag_does_not_move_offset() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        s.drag_begin(now);
        s.drag_update(-42.0, now);
        let before = s.offset();

        assert!(s.tick(now).is_empty());
        assert_eq!(s.offset(), before);
        assert_eq!(s.state(), ScrubState::Dragging);
    }

    #[test]
    fn test_tick_stops_when_exhausted() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        s.drag_begin(now);
        s.drag_update(-2000.0, now);
        s.drag_end(now);

        assert_eq!(s.offset().px(), -1000.0);
        assert_eq!(s.tick(now), vec![SyncEffect::StopTicker]);
        assert_eq!(s.offset().px(), -1000.0);
    }

    #[test]
    fn test_drag_to_minus_500_seeks_half_duration_once() {
        let (mut s, now) = loaded(200);
        let began = s.drag_begin(now);
        assert_eq!(
            began,
            vec![SyncEffect::DragStarted {
                offset: VisualOffset::ZERO
            }]
        );

        s.drag_update(-120.0, now);
        s.drag_update(-350.0, now);
        s.drag_update(-500.0, now);
        let effects = s.drag_end(now);

        assert_eq!(seeks(&effects), vec![Duration::from_secs(100)]);
        assert_eq!(effects[0], SyncEffect::DragEnded { segment: 100 });
        // Paused before the drag, still paused after it.
        assert_eq!(s.state(), ScrubState::Stopped);
        assert!(!effects.contains(&SyncEffect::StartTicker));
    }

    #[test]
    fn test_drag_while_playing_freezes_and_resumes_ticker() {
        let (mut s, now) = loaded(200);
        s.toggle(now);

        let began = s.drag_begin(now);
        assert_eq!(began[0], SyncEffect::StopTicker);

        s.drag_update(-250.0, now);
        let ended = s.drag_end(now);
        assert_eq!(seeks(&ended), vec![Duration::from_secs(50)]);
        assert_eq!(ended.last(), Some(&SyncEffect::StartTicker));
        assert_eq!(s.state(), ScrubState::Playing);
    }

    #[test]
    fn test_drag_clamps_and_snaps() {
        let (mut s, now) = loaded(200);
        s.drag_begin(now);

        s.drag_update(80.0, now);
        assert_eq!(s.offset(), VisualOffset::ZERO);

        s.drag_update(-5000.0, now);
        assert_eq!(s.offset().px(), -1000.0);

        s.drag_update(-12.4, now);
        let effects = s.drag_end(now);
        assert_eq!(effects[0], SyncEffect::DragEnded { segment: 2 });
        assert_eq!(s.offset().px(), -10.0);
    }

    #[test]
    fn test_drag_origin_is_displayed_offset() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        s.tick(now);
        s.tick(now + EASE);

        // Grab the waveform half-way through the second glide.
        let grab = now + EASE + EASE / 2;
        let shown = s.displayed_offset(grab);
        s.drag_begin(grab);
        assert_eq!(s.offset(), shown);
        assert!(shown.px() > -10.0 && shown.px() < -5.0);
    }

    #[test]
    fn test_drag_before_load_queues_then_replays() {
        let (mut s, now) = sync(EndBehavior::Stop);
        s.drag_begin(now);
        s.drag_update(-250.0, now);
        let ended = s.drag_end(now);

        assert_eq!(ended[1], SyncEffect::SeekQueued { segment: 50 });
        assert!(seeks(&ended).is_empty());
        assert_eq!(s.pending_seek(), Some(50));

        let replay = s.on_loaded(Some(Duration::from_secs(200)));
        assert_eq!(
            replay,
            vec![SyncEffect::Seek {
                segment: 50,
                position: Duration::from_secs(50),
                replayed: true
            }]
        );
        assert_eq!(s.pending_seek(), None);
    }

    #[test]
    fn test_load_failure_drops_queued_seek() {
        let (mut s, now) = sync(EndBehavior::Stop);
        s.drag_begin(now);
        s.drag_update(-50.0, now);
        s.drag_end(now);

        s.on_load_failed();
        assert_eq!(s.pending_seek(), None);
    }

    #[test]
    fn test_ended_resets_offset_and_stops() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        s.tick(now);
        s.tick(now);

        let effects = s.on_ended(now);
        assert_eq!(s.offset(), VisualOffset::ZERO);
        assert_eq!(s.intent(), PlayIntent::Paused);
        assert_eq!(effects[0], SyncEffect::StopTicker);
        assert_eq!(seeks(&effects), vec![Duration::ZERO]);
    }

    #[test]
    fn test_ended_with_repeat_seeks_zero_and_keeps_playing() {
        let (mut s, now) = sync(EndBehavior::Repeat);
        s.on_loaded(Some(Duration::from_secs(30)));
        s.toggle(now);
        s.tick(now);

        let effects = s.on_ended(now);
        assert_eq!(
            effects,
            vec![
                SyncEffect::Seek {
                    segment: 0,
                    position: Duration::ZERO,
                    replayed: false
                },
                SyncEffect::Play,
                SyncEffect::StartTicker
            ]
        );
        assert_eq!(s.offset(), VisualOffset::ZERO);
        assert_eq!(s.state(), ScrubState::Playing);
    }

    #[test]
    fn test_ended_with_advance() {
        let (mut s, now) = sync(EndBehavior::Advance);
        s.on_loaded(Some(Duration::from_secs(30)));
        s.toggle(now);

        let effects = s.on_ended(now);
        assert_eq!(effects.last(), Some(&SyncEffect::AdvanceTrack));
        assert_eq!(s.intent(), PlayIntent::Paused);
    }

    #[test]
    fn test_ended_while_dragging_leaves_offset_to_gesture() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        s.drag_begin(now);
        s.drag_update(-100.0, now);

        assert!(s.on_ended(now).is_empty());
        assert_eq!(s.offset().px(), -100.0);

        let effects = s.drag_end(now);
        assert_eq!(seeks(&effects), vec![Duration::from_secs(20)]);
        assert!(!effects.contains(&SyncEffect::StartTicker));
    }

    #[test]
    fn test_tick_period() {
        let (s, _) = loaded(200);
        assert_eq!(s.tick_period(None), Some(Duration::from_secs(1)));
        assert_eq!(
            s.tick_period(Some(Duration::from_millis(40))),
            Some(Duration::from_millis(40))
        );

        let (unknown, _) = sync(EndBehavior::Stop);
        assert_eq!(unknown.tick_period(None), None);
    }

    #[test]
    fn test_lane_heights_follow_intent() {
        let (mut s, now) = loaded(200);
        let style = WaveformStyle::default();

        assert_eq!(s.lanes_at(now, &style), style.lanes(false));
        s.toggle(now);
        assert_eq!(s.lanes_at(now + EASE, &style), style.lanes(true));
    }

    #[test]
    fn test_halt_clears_intent() {
        let (mut s, now) = loaded(200);
        s.toggle(now);
        assert_eq!(s.halt(now), vec![SyncEffect::StopTicker]);
        assert_eq!(s.state(), ScrubState::Stopped);
    }
}
