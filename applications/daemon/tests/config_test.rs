//! Daemon configuration loading

use cadence_daemon::{DaemonConfig, DaemonError};
use cadence_playback::NotificationMode;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("cadence.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn defaults_without_a_file() {
    let config = DaemonConfig::from_sources(None, None).unwrap();

    assert_eq!(config.library.index, PathBuf::from("library.json"));
    assert_eq!(config.state.file, PathBuf::from("queue.json"));
    assert!(config.library.watch);
    assert!(!config.library.random_fill);
    assert!(config.playback.headset_pause);
    assert_eq!(config.playback.user_volume, 1.0);
    assert!(!config.audio.assume_headset);
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[playback]
headset_only = true
user_volume = 0.5
notification_mode = "always"
idle_timeout_enabled = true
idle_timeout_seconds = 900

[library]
index = "/srv/music/index.json"
random_fill = true
watch = false

[state]
file = "/var/lib/cadence/queue.json"

[audio]
assume_headset = true
"#,
    );

    let config = DaemonConfig::from_sources(Some(&path), None).unwrap();

    assert!(config.playback.headset_only);
    assert_eq!(config.playback.user_volume, 0.5);
    assert_eq!(config.playback.notification_mode, NotificationMode::Always);
    assert_eq!(
        config.playback.idle_timeout(),
        Some(std::time::Duration::from_secs(900))
    );
    // Unset keys inside a present section keep their defaults
    assert!(config.playback.headset_pause);

    assert_eq!(config.library.index, PathBuf::from("/srv/music/index.json"));
    assert!(config.library.random_fill);
    assert!(!config.library.watch);
    assert_eq!(config.library.watch_debounce_ms, 500);
    assert_eq!(
        config.state.file,
        PathBuf::from("/var/lib/cadence/queue.json")
    );
    assert!(config.audio.assume_headset);
    assert!(!config.audio.external_output);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = DaemonConfig::from_sources(Some(&path), None).unwrap_err();
    assert!(matches!(err, DaemonError::Config(msg) if msg.contains("absent.toml")));
}

#[test]
fn out_of_range_volume_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[playback]\nuser_volume = 1.5\n");

    let err = DaemonConfig::from_sources(Some(&path), None).unwrap_err();
    assert!(matches!(err, DaemonError::Config(msg) if msg.contains("user_volume")));
}

#[test]
fn index_and_state_must_differ() {
    let mut config = DaemonConfig::default();
    config.state.file = config.library.index.clone();
    assert!(config.validate().is_err());

    config.state.file = PathBuf::new();
    assert!(config.validate().is_err());
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[playback\nuser_volume = ");

    assert!(matches!(
        DaemonConfig::from_sources(Some(&path), None),
        Err(DaemonError::Config(_))
    ));
}
