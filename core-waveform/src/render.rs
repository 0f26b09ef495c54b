//! # Waveform Layout
//!
//! Turns [`WaveformSamples`] into two mirrored rows of bars:
//!
//! ```text
//!   top lane     ▂▅█▇▃▂▅▆█▅▂     bars grow upward from the baseline
//!   ─────────────────────────── baseline
//!   bottom lane  ▔▀▀▔▀▀▀▀▔▔     same bars, hanging down, faded
//! ```
//!
//! The region left of the play head (`-offset` pixels wide) is highlighted as
//! played. Lane heights shrink while paused, which the UI eases between.

use serde::{Deserialize, Serialize};

use crate::samples::{WaveformSamples, MAX_AMPLITUDE};
use crate::segment::{SegmentModel, VisualOffset, STICK_MARGIN, STICK_WIDTH};

/// Visual constants of the waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformStyle {
    pub stick_width: f32,
    pub stick_margin: f32,
    pub playing_lanes: LaneHeights,
    pub paused_lanes: LaneHeights,
    /// Opacity of the mirrored bottom row.
    pub mirrored_opacity: f32,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            stick_width: STICK_WIDTH,
            stick_margin: STICK_MARGIN,
            playing_lanes: LaneHeights {
                top: 50.0,
                bottom: 40.0,
            },
            paused_lanes: LaneHeights {
                top: 5.0,
                bottom: 4.0,
            },
            mirrored_opacity: 0.3,
        }
    }
}

impl WaveformStyle {
    /// Drawn width of one bar when bars sit `pitch` pixels apart. The
    /// stick/margin ratio is kept whatever the segment width is.
    pub fn bar_width(&self, pitch: f32) -> f32 {
        let styled_pitch = self.stick_width + self.stick_margin;
        if styled_pitch > 0.0 {
            pitch * self.stick_width / styled_pitch
        } else {
            pitch
        }
    }

    pub fn lanes(&self, playing: bool) -> LaneHeights {
        if playing {
            self.playing_lanes
        } else {
            self.paused_lanes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneHeights {
    pub top: f32,
    pub bottom: f32,
}

/// One drawn bar. `y` is measured from the top of its lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformLayout {
    pub top: Vec<Bar>,
    pub bottom: Vec<Bar>,
    pub lanes: LaneHeights,
    /// Horizontal translation applied to both rows.
    pub translate_x: f32,
    /// Width of the highlighted, already-played region.
    pub played_width: f32,
    pub total_width: f32,
}

impl WaveformLayout {
    pub fn compute(
        samples: &WaveformSamples,
        model: &SegmentModel,
        style: &WaveformStyle,
        lanes: LaneHeights,
        offset: VisualOffset,
    ) -> Self {
        // Bars must stay on the segment grid the offset moves along.
        let pitch = model.segment_width();
        let width = style.bar_width(pitch);
        let mut top = Vec::with_capacity(samples.len());
        let mut bottom = Vec::with_capacity(samples.len());

        for (index, value) in samples.iter().enumerate() {
            let x = index as f32 * pitch;
            let fraction = value / MAX_AMPLITUDE;

            let top_height = fraction * lanes.top;
            top.push(Bar {
                x,
                y: lanes.top - top_height,
                width,
                height: top_height,
                opacity: 1.0,
            });

            bottom.push(Bar {
                x,
                y: 0.0,
                width,
                height: fraction * lanes.bottom,
                opacity: style.mirrored_opacity,
            });
        }

        Self {
            top,
            bottom,
            lanes,
            translate_x: offset.px(),
            played_width: offset.played_width(),
            total_width: model.total_width(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(values: &[f32], playing: bool, offset_px: f32) -> WaveformLayout {
        layout_with_width(values, 5.0, playing, offset_px)
    }

    fn layout_with_width(
        values: &[f32],
        segment_width: f32,
        playing: bool,
        offset_px: f32,
    ) -> WaveformLayout {
        let model = SegmentModel::new(values.len().max(1), segment_width).unwrap();
        let style = WaveformStyle::default();
        let samples = WaveformSamples::from_raw(values, model.bars_num());
        WaveformLayout::compute(&samples, &model, &style, style.lanes(playing), model.clamp_offset(offset_px))
    }

    #[test]
    fn test_bars_are_mirrored() {
        let layout = layout(&[100.0, 50.0, 0.0], true, 0.0);

        assert_eq!(layout.top.len(), 3);
        assert_eq!(layout.bottom.len(), 3);
        assert_eq!(layout.top[0].height, 50.0);
        assert_eq!(layout.bottom[0].height, 40.0);
        assert_eq!(layout.top[1].height, 25.0);
        assert_eq!(layout.top[1].y, 25.0);
        assert_eq!(layout.bottom[1].y, 0.0);
        assert_eq!(layout.top[2].height, 0.0);
        assert_eq!(layout.bottom[2].opacity, 0.3);
        assert_eq!(layout.top[2].opacity, 1.0);
    }

    #[test]
    fn test_bar_positions_follow_pitch() {
        let layout = layout(&[10.0, 20.0, 30.0, 40.0], false, 0.0);
        let xs: Vec<f32> = layout.top.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![0.0, 5.0, 10.0, 15.0]);
        assert!(layout.top.iter().all(|b| b.width == 3.0));
        assert_eq!(layout.total_width, 20.0);
    }

    #[test]
    fn test_wider_segments_keep_bars_on_the_offset_grid() {
        let layout = layout_with_width(&[10.0, 20.0, 30.0, 40.0], 8.0, true, -16.0);
        let model = SegmentModel::new(4, 8.0).unwrap();

        for (segment, bar) in layout.top.iter().enumerate() {
            assert_eq!(bar.x, -model.offset_for_segment(segment).px());
            assert!((bar.width - 4.8).abs() < 1e-5);
        }
        // The played region ends exactly where bar 2 starts.
        assert_eq!(layout.played_width, layout.top[2].x);
        assert_eq!(layout.total_width, 32.0);
    }

    #[test]
    fn test_paused_lanes_are_collapsed() {
        let layout = layout(&[100.0], false, 0.0);
        assert_eq!(layout.lanes, LaneHeights { top: 5.0, bottom: 4.0 });
        assert_eq!(layout.top[0].height, 5.0);
        assert_eq!(layout.bottom[0].height, 4.0);
    }

    #[test]
    fn test_played_width_tracks_offset() {
        let layout = layout(&[1.0, 2.0, 3.0, 4.0], true, -12.5);
        assert_eq!(layout.translate_x, -12.5);
        assert_eq!(layout.played_width, 12.5);
    }

    #[test]
    fn test_empty_samples_draw_nothing() {
        let layout = layout(&[], true, 0.0);
        assert!(layout.is_empty());
        assert!(layout.bottom.is_empty());
    }
}
