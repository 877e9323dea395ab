//! All the primitives, gather here.
//!
//! - Error and Result
//! - Logging

pub use anyhow::{anyhow, Context};
pub use tracing::instrument;

use thiserror::Error;

/// Thumbnail Error
///
/// A skipped thumbnail is not an error. See [`crate::thumb::create_thumbnail`].
#[derive(Debug, Error)]
pub enum ThumbError {
    /// Width or height was zero. Raised before any planning happens.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The source could not be loaded into a drawable surface.
    ///
    /// Callers should treat this as "thumbnail unavailable".
    #[error("Decode error: {0}")]
    Decode(#[source] anyhow::Error),

    /// The final surface could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[source] anyhow::Error),

    /// The blocking worker went away (panicked or was cancelled).
    #[error("Worker join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// General result type
pub type Result<T> = std::result::Result<T, ThumbError>;
