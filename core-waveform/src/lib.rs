//! # Waveform Model
//!
//! Pure, synchronous building blocks for the scrubbable waveform:
//!
//! - [`segment`]: segment index, time and pixel offset conversions
//! - [`samples`]: amplitude normalization
//! - [`render`]: mirrored bar layout
//! - [`tween`]: eased transitions for offset and lane heights
//!
//! Nothing here owns state across tracks or performs I/O.

pub mod error;
pub mod render;
pub mod samples;
pub mod segment;
pub mod tween;

pub use error::{Result, WaveformError};
pub use render::{Bar, LaneHeights, WaveformLayout, WaveformStyle};
pub use samples::{WaveformSamples, MAX_AMPLITUDE};
pub use segment::{
    SegmentModel, VisualOffset, DEFAULT_BARS_NUM, SEGMENT_WIDTH, STICK_MARGIN, STICK_WIDTH,
};
pub use tween::{Easing, Tween, DEFAULT_EASE_DURATION};
