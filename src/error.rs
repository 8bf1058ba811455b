// THEORY:
// A single error type for every fallible operation in the engine. Most of the
// rendering core is made of pure functions that cannot fail: degenerate
// geometry is skipped, degenerate indicator ranges collapse to a midpoint and
// a missing edge extractor falls back to passthrough. What remains are the
// true boundaries with the outside world: decoding the upload, encoding the
// output, the edge collaborator and the configuration surface.

use thiserror::Error;

/// Errors that can abort a render or an export.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PortraitError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("edge extraction failed: {0}")]
    EdgeExtraction(String),

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("invalid render configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PortraitError>;
