use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveformError {
    #[error("Segment count must be greater than zero")]
    NoSegments,

    #[error("Segment width must be finite and positive, got {0}")]
    InvalidSegmentWidth(f32),
}

pub type Result<T> = std::result::Result<T, WaveformError>;
