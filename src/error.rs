//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = WbpeError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, tokenization, or persistence.
#[derive(Debug, Error)]
pub enum WbpeError {
    /// Training configuration or caller input failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An internal invariant of the vocabulary was violated.
    #[error("invariant violation: {0}")]
    Invariant(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WbpeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl WbpeError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }

    /// Returns `true` when the error signals a defect rather than bad input.
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}
