//! Content store errors

use std::io;
use thiserror::Error;

use crate::artifact::ArtifactId;

#[derive(Debug, Error)]
pub enum DepotError {
    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    #[error("invalid artifact id: {0:?}")]
    InvalidId(String),

    /// `actual` stops at `declared + 1` for oversized uploads; the rest of
    /// the stream is never read.
    #[error("declared size {declared} does not match {actual} bytes received")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        source: io::Error,
    },
}

impl DepotError {
    /// Adapter for `map_err` that tags an I/O error with what was being done.
    pub(crate) fn io(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| DepotError::Io { context, source }
    }
}

pub type Result<T> = std::result::Result<T, DepotError>;
