use std::io;
use thiserror::Error;

/// Errors surfaced by the key search, the frame coordinator and the frame adapters.
///
/// The transform itself has no failure modes; a row stride mismatch between
/// input and output is a caller bug and panics instead.
#[derive(Error, Debug)]
pub enum ScrambleError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("No frame captured yet, key search unavailable")]
    SnapshotUnavailable,

    #[error("Key search cancelled")]
    Cancelled,

    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ScrambleError>;
