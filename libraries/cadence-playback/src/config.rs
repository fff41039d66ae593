//! Playback preferences

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the persistent notification is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationMode {
    /// Never show it, and never run as a foreground service
    Never,
    /// Show it only while playing
    #[default]
    WhenPlaying,
    /// Keep it visible whenever there is a current track
    Always,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pause when a headset is unplugged (default: true)
    #[serde(default = "default_true")]
    pub headset_pause: bool,

    /// Refuse to play through the built-in speaker (default: false)
    #[serde(default)]
    pub headset_only: bool,

    /// Notification visibility (default: when playing)
    #[serde(default)]
    pub notification_mode: NotificationMode,

    /// Mirror state changes to the scrobbler (default: false)
    #[serde(default)]
    pub scrobble: bool,

    /// User volume, 0.0 to 1.0 (default: 1.0)
    #[serde(default = "default_user_volume")]
    pub user_volume: f32,

    /// Whether the idle shutoff is armed (default: false)
    #[serde(default)]
    pub idle_timeout_enabled: bool,

    /// Idle shutoff delay in seconds (default: 3600)
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    /// Listen for hardware media buttons (default: true)
    #[serde(default = "default_true")]
    pub media_buttons: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            headset_pause: true,
            headset_only: false,
            notification_mode: NotificationMode::default(),
            scrobble: false,
            user_volume: default_user_volume(),
            idle_timeout_enabled: false,
            idle_timeout_seconds: default_idle_timeout_seconds(),
            media_buttons: true,
        }
    }
}

impl PlaybackConfig {
    /// Effective idle delay, `None` when disabled or zero
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_enabled && self.idle_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.idle_timeout_seconds))
    }

    /// User volume clamped to the valid range
    pub fn volume(&self) -> f32 {
        clamp_volume(self.user_volume)
    }

    /// Store a single changed preference
    pub fn apply(&mut self, change: &ConfigChange) {
        match *change {
            ConfigChange::HeadsetPause(on) => self.headset_pause = on,
            ConfigChange::HeadsetOnly(on) => self.headset_only = on,
            ConfigChange::NotificationMode(mode) => self.notification_mode = mode,
            ConfigChange::Scrobble(on) => self.scrobble = on,
            ConfigChange::UserVolume(volume) => self.user_volume = clamp_volume(volume),
            ConfigChange::MediaButtons(on) => self.media_buttons = on,
            ConfigChange::IdleTimeout { enabled, seconds } => {
                self.idle_timeout_enabled = enabled;
                self.idle_timeout_seconds = seconds;
            }
        }
    }
}

/// A single live preference change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigChange {
    /// Pause on unplug
    HeadsetPause(bool),
    /// Speaker playback refusal
    HeadsetOnly(bool),
    /// Notification visibility
    NotificationMode(NotificationMode),
    /// Scrobble mirroring
    Scrobble(bool),
    /// User volume
    UserVolume(f32),
    /// Media button listener
    MediaButtons(bool),
    /// Idle shutoff
    IdleTimeout {
        /// Whether the timer is armed
        enabled: bool,
        /// Delay in seconds
        seconds: u64,
    },
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return default_user_volume();
    }
    volume.clamp(0.0, 1.0)
}

fn default_true() -> bool {
    true
}

fn default_user_volume() -> f32 {
    1.0
}

fn default_idle_timeout_seconds() -> u64 {
    3600
}
