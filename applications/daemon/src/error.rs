/// Daemon error types
use cadence_core::CoreError;
use cadence_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio output error: {0}")]
    Audio(String),

    #[error("Library index error: {0}")]
    Index(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Library error: {0}")]
    Library(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(err: config::ConfigError) -> Self {
        DaemonError::Config(err.to_string())
    }
}
