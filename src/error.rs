//! Crate error types.
//!
//! The polling path never returns errors: anomalies are absorbed and
//! self-correct on the next poll. Only persistent, user-facing failures
//! surface here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopeError>;

#[derive(Error, Debug)]
pub enum ScopeError {
    /// The view has no source stream (or the stream has no channels).
    #[error("no source stream attached")]
    NoSource,

    /// Writing the bitmap snapshot failed.
    #[cfg(feature = "snapshot")]
    #[error("failed to save snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}
