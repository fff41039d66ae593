//! Error types for playback management

use cadence_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track has no locator to play from
    #[error("Track has no playable source")]
    NoSource,

    /// Audio source could not be opened
    #[error("Failed to open {path:?}: {reason}")]
    Source {
        /// Locator that failed
        path: PathBuf,
        /// Backend message
        reason: String,
    },

    /// Player failed to prepare the source
    #[error("Prepare failed: {0}")]
    Prepare(String),

    /// Seek rejected by the player
    #[error("Seek failed: {0}")]
    Seek(String),

    /// Player was used after release
    #[error("Player released")]
    Released,

    /// Event source registration failed
    #[error("Failed to register {source_name}: {reason}")]
    Registration {
        /// Source that failed
        source_name: String,
        /// Backend message
        reason: String,
    },

    /// Queue state could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The controller is gone
    #[error("Command channel closed")]
    ChannelClosed,

    /// The controller thread panicked
    #[error("Playback controller thread panicked")]
    WorkerPanicked,

    /// Library errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Create a source error
    pub fn source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Source {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a prepare error
    pub fn prepare(msg: impl Into<String>) -> Self {
        Self::Prepare(msg.into())
    }

    /// Create a registration error
    pub fn registration(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
