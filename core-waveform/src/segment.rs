//! # Segment Model
//!
//! A track is drawn as `bars_num` bars laid out left to right, each occupying
//! one segment of `segment_width` pixels. Scrolling the waveform left by one
//! segment corresponds to `duration / bars_num` of playback time.
//!
//! ```text
//!   offset:   0        -W        -2W   ...   -bars*W (max_offset)
//!   segment:  0         1          2   ...    bars
//!   time:     0    d/bars    2d/bars   ...    d
//! ```
//!
//! Every mapping here is pure and clamps its result, so a [`VisualOffset`]
//! produced by this module always lies in `[max_offset, 0]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveformError};

/// Bars drawn per track.
pub const DEFAULT_BARS_NUM: usize = 200;
/// Width of a single bar in pixels.
pub const STICK_WIDTH: f32 = 3.0;
/// Gap after each bar in pixels.
pub const STICK_MARGIN: f32 = 2.0;
/// Horizontal space one bar occupies.
pub const SEGMENT_WIDTH: f32 = STICK_WIDTH + STICK_MARGIN;

/// Horizontal scroll of the waveform in pixels. Never positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct VisualOffset(f32);

impl VisualOffset {
    pub const ZERO: VisualOffset = VisualOffset(0.0);

    pub fn px(self) -> f32 {
        self.0
    }

    /// Width of the already-played region, which is `-offset`.
    pub fn played_width(self) -> f32 {
        -self.0
    }
}

/// Discretization of a track into fixed-width segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentModel {
    bars_num: usize,
    segment_width: f32,
}

impl Default for SegmentModel {
    fn default() -> Self {
        Self {
            bars_num: DEFAULT_BARS_NUM,
            segment_width: SEGMENT_WIDTH,
        }
    }
}

impl SegmentModel {
    pub fn new(bars_num: usize, segment_width: f32) -> Result<Self> {
        if bars_num == 0 {
            return Err(WaveformError::NoSegments);
        }
        if !segment_width.is_finite() || segment_width <= 0.0 {
            return Err(WaveformError::InvalidSegmentWidth(segment_width));
        }
        Ok(Self {
            bars_num,
            segment_width,
        })
    }

    pub fn bars_num(&self) -> usize {
        self.bars_num
    }

    pub fn segment_width(&self) -> f32 {
        self.segment_width
    }

    /// Leftmost reachable offset, `-bars_num * segment_width`.
    pub fn max_offset(&self) -> f32 {
        -(self.bars_num as f32 * self.segment_width)
    }

    /// Clamp raw pixels into `[max_offset, 0]`. NaN maps to 0.
    pub fn clamp_offset(&self, px: f32) -> VisualOffset {
        if px.is_nan() {
            return VisualOffset::ZERO;
        }
        VisualOffset(px.clamp(self.max_offset(), 0.0))
    }

    pub fn offset_for_segment(&self, segment: usize) -> VisualOffset {
        self.clamp_offset(-(segment as f32) * self.segment_width)
    }

    /// Nearest segment to `offset`, in `[0, bars_num]`.
    pub fn segment_for_offset(&self, offset: VisualOffset) -> usize {
        let raw = (-offset.px() / self.segment_width).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.bars_num)
        }
    }

    /// Playback position at the start of `segment`.
    pub fn time_for_segment(&self, segment: usize, duration: Duration) -> Duration {
        let segment = segment.min(self.bars_num) as u128;
        let nanos = duration.as_nanos() * segment / self.bars_num as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Segment containing playback position `position` (floored).
    pub fn segment_for_time(&self, position: Duration, duration: Duration) -> usize {
        if duration.is_zero() {
            return 0;
        }
        let segment = position.as_nanos() * self.bars_num as u128 / duration.as_nanos();
        segment.min(self.bars_num as u128) as usize
    }

    /// Playback time covered by one segment.
    pub fn segment_duration(&self, duration: Duration) -> Duration {
        duration / self.bars_num as u32
    }

    /// Offset one segment further left, clamped.
    pub fn advance(&self, offset: VisualOffset) -> VisualOffset {
        self.clamp_offset(offset.px() - self.segment_width)
    }

    /// True once the waveform has scrolled to its end.
    pub fn is_exhausted(&self, offset: VisualOffset) -> bool {
        offset.px() <= self.max_offset()
    }

    /// Total pixel width of the drawn waveform.
    pub fn total_width(&self) -> f32 {
        -self.max_offset()
    }
}
