/// Core error types for Cadence
use thiserror::Error;

use crate::types::TrackId;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Cadence
#[derive(Error, Debug)]
pub enum CoreError {
    /// Library backend failed to answer a query
    #[error("Library error: {0}")]
    Library(String),

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Numeric item kind outside artist/album/track
    #[error("Invalid item kind: {0}")]
    InvalidItemKind(i32),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a library error
    pub fn library(msg: impl Into<String>) -> Self {
        Self::Library(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
