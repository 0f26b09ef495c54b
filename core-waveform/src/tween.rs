//! Eased transitions between two scalar values.
//!
//! The waveform advances in whole segments, but the visible offset glides to
//! each new segment over a short interval. A [`Tween`] describes one such
//! glide and is sampled with [`Tween::value_at`] by whoever draws the frame.

use std::time::{Duration, Instant};

/// Default glide length for offset and lane-height transitions.
pub const DEFAULT_EASE_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    InOutQuad,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// A tween already resting at `value`.
    pub fn settled(value: f32, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
            easing: Easing::Linear,
        }
    }

    pub fn new(from: f32, to: f32, start: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// Start a new glide towards `to` from wherever this one currently is.
    pub fn retarget(&self, to: f32, now: Instant, duration: Duration) -> Self {
        Self::new(self.value_at(now), to, now, duration, self.easing_or_default())
    }

    fn easing_or_default(&self) -> Easing {
        if self.duration.is_zero() {
            Easing::default()
        } else {
            self.easing
        }
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start);
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn origin(&self) -> f32 {
        self.from
    }
}
