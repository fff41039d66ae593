/// Daemon configuration
use crate::error::{DaemonError, Result};
use cadence_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    /// Preferences handed to the playback controller
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub state: StateSettings,

    #[serde(default)]
    pub audio: AudioSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// JSON track index
    #[serde(default = "default_index")]
    pub index: PathBuf,

    /// Keep playing random library tracks once the queue runs out
    #[serde(default)]
    pub random_fill: bool,

    /// Reload the index when it changes on disk
    #[serde(default = "default_watch")]
    pub watch: bool,

    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateSettings {
    /// Where the queue is persisted between runs
    #[serde(default = "default_state_file")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AudioSettings {
    /// Treat the output as a headset at startup
    #[serde(default)]
    pub assume_headset: bool,

    /// Output goes to an external device rather than the built-in speaker
    #[serde(default)]
    pub external_output: bool,
}

impl DaemonConfig {
    /// Load from `path` (or `cadence.toml` if present), then the environment.
    ///
    /// Environment keys use the `CADENCE_` prefix and `__` between sections,
    /// e.g. `CADENCE_PLAYBACK__USER_VOLUME=0.5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = config::Environment::with_prefix("CADENCE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::from_sources(path, Some(environment))
    }

    /// Load from an optional file and optional environment source
    pub fn from_sources(path: Option<&Path>, environment: Option<config::Environment>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(DaemonError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        if let Some(environment) = environment {
            settings = settings.add_source(environment);
        }

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.playback.user_volume) {
            return Err(DaemonError::Config(format!(
                "playback.user_volume must be between 0 and 1, got {}",
                self.playback.user_volume
            )));
        }

        if self.library.index.as_os_str().is_empty() {
            return Err(DaemonError::Config(
                "library.index must not be empty".to_string(),
            ));
        }

        if self.state.file.as_os_str().is_empty() {
            return Err(DaemonError::Config(
                "state.file must not be empty".to_string(),
            ));
        }

        if self.library.index == self.state.file {
            return Err(DaemonError::Config(format!(
                "library.index and state.file both point at {}",
                self.state.file.display()
            )));
        }

        Ok(())
    }
}

// Default values
fn default_index() -> PathBuf {
    PathBuf::from("library.json")
}

fn default_watch() -> bool {
    true
}

fn default_watch_debounce_ms() -> u64 {
    500
}

fn default_state_file() -> PathBuf {
    PathBuf::from("queue.json")
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            index: default_index(),
            random_fill: false,
            watch: default_watch(),
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            file: default_state_file(),
        }
    }
}
