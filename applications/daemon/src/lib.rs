//! Cadence Daemon
//!
//! Headless host for the playback controller: rodio output, a JSON track
//! index watched for changes, and a line console standing in for the
//! notification, headset, telephony and media-button integrations a mobile
//! host would provide.

pub mod config;
pub mod console;
pub mod error;
pub mod library;
pub mod platform;
pub mod player;
pub mod watcher;

pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use library::IndexLibrary;
