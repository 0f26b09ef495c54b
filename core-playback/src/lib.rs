//! # Playback
//!
//! Thin state-tracking wrapper around the host [`AudioBackend`]:
//!
//! - [`PlaybackController`] holds the single live decoder handle
//! - [`PlaybackError`] classifies decode-side failures
//!
//! [`AudioBackend`]: bridge_traits::playback::AudioBackend

pub mod controller;
pub mod error;

pub use controller::{
    usable_duration, PlaybackController, PlaybackState, TransportCall, TransportOp, TransportOutcome,
};
pub use error::{PlaybackError, Result};
