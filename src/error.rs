use std::path::PathBuf;
use thiserror::Error;

/// Reasons a detection frame is refused at the IPC boundary.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("frame dimensions must be positive and finite, got {width}x{height}")]
    BadDimensions { width: f32, height: f32 },
    #[error("hand {hand} landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { hand: usize, index: usize },
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is empty")]
    Empty(PathBuf),
    #[error("{0} is neither a PNG nor an SVG image")]
    UnknownFormat(PathBuf),
}
