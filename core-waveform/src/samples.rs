//! Amplitude samples for one track.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest amplitude value; samples are percentages of the lane height.
pub const MAX_AMPLITUDE: f32 = 100.0;

/// Normalized amplitudes, one per bar.
///
/// Built once per track load and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaveformSamples {
    values: Vec<f32>,
}

impl WaveformSamples {
    /// Normalize raw server values to exactly `bars_num` samples in `[0, 100]`.
    ///
    /// Non-finite values become 0. A length mismatch is resolved by
    /// nearest-index resampling. Empty input stays empty.
    pub fn from_raw(raw: &[f32], bars_num: usize) -> Self {
        if raw.is_empty() || bars_num == 0 {
            return Self::default();
        }

        let clamp = |v: f32| {
            if v.is_finite() {
                v.clamp(0.0, MAX_AMPLITUDE)
            } else {
                0.0
            }
        };

        let values = if raw.len() == bars_num {
            raw.iter().copied().map(clamp).collect()
        } else {
            debug!(
                received = raw.len(),
                bars_num, "Resampling waveform to bar count"
            );
            let scale = raw.len() as f64 / bars_num as f64;
            (0..bars_num)
                .map(|i| {
                    let source = ((i as f64 + 0.5) * scale).floor() as usize;
                    clamp(raw[source.min(raw.len() - 1)])
                })
                .collect()
        };

        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, segment: usize) -> Option<f32> {
        self.values.get(segment).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }
}
