//! Error types for stashkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StashError
pub type Result<T> = std::result::Result<T, StashError>;

/// Unified error type for stashkv operations
#[derive(Debug, Error)]
pub enum StashError {
    // -------------------------------------------------------------------------
    // Encoder Errors
    // -------------------------------------------------------------------------
    #[error("encode data: {0}")]
    Encode(#[source] CodecError),

    #[error("decode data: {0}")]
    Decode(#[source] CodecError),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Log corruption detected: {0}")]
    LogCorruption(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure raised by an [`Encoder`](crate::encoder::Encoder).
///
/// Displays only the underlying message; [`StashError`] adds the
/// `encode data:` / `decode data:` prefix.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    /// Build a codec error from any displayable message
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        CodecError::Custom(msg.to_string())
    }
}
