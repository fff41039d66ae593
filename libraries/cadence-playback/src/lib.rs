//! Cadence - Playback Controller
//!
//! Background playback controller for Cadence. It owns the playback state
//! machine, serializes every request through a single command queue, and
//! keeps the player, queue, notification and event sources consistent.
//!
//! This crate provides:
//! - Playback flags (playing, no media, shuffle, repeat) with one commit point
//! - Track loading with a single skip-on-failure retry
//! - Idle timeout with a quartic volume fade
//! - Debounced toggle/next with double-press UI launch
//! - Headset, telephony and library-change interruptions
//! - An in-memory persistent queue with random fill
//!
//! # Architecture
//!
//! `cadence-playback` is platform-agnostic:
//! - No dependency on an audio backend
//! - No dependency on a UI toolkit
//! - No async runtime; the controller runs on a plain thread
//!
//! Hosts provide the player, wake lock, presenter, output route and event
//! sources through traits. Every entry point takes the current `Instant`, so
//! the controller can be driven deterministically from tests.
//!
//! # Example: Queue
//!
//! ```rust
//! use cadence_core::{AlbumId, ItemKind, MemoryLibrary, Track, TrackId};
//! use cadence_playback::{ChooseMode, Queue, Timeline};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let library = Arc::new(MemoryLibrary::new(vec![
//!     Track::new(TrackId::new(1), PathBuf::from("/music/b.flac"))
//!         .with_album(AlbumId::new(7), "Album")
//!         .with_track_number(2),
//!     Track::new(TrackId::new(2), PathBuf::from("/music/a.flac"))
//!         .with_album(AlbumId::new(7), "Album")
//!         .with_track_number(1),
//! ]));
//!
//! let mut queue = Timeline::new(library);
//! let chosen = queue.choose_items(ChooseMode::Play, ItemKind::Album, 7)?;
//! assert_eq!(chosen.added, 2);
//! assert_eq!(queue.get(0).map(|t| t.id), Some(TrackId::new(2)));
//! # Ok::<(), cadence_playback::PlaybackError>(())
//! ```
//!
//! # Example: Flags
//!
//! ```rust
//! use cadence_playback::PlaybackState;
//!
//! let state = PlaybackState::PLAYING | PlaybackState::REPEAT;
//! assert!(state.is_playing());
//! assert_eq!(state.to_string(), "playing|repeat");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod controller;
mod error;
mod events;
mod platform;
mod player;
mod queue;
pub mod random;
pub mod scheduler;
mod session;
mod state;
mod timeline;
pub mod volume;
mod worker;

// Public exports
pub use command::{command_channel, CallState, Command, CommandReceiver, CommandSender};
pub use config::{ConfigChange, NotificationMode, PlaybackConfig};
pub use controller::{Controller, SharedSnapshot};
pub use error::{PlaybackError, Result};
pub use events::{EventBus, PlaybackEvent};
pub use platform::{
    EventSource, Notification, OutputRoute, Platform, Presenter, Scrobbler, SourceKind, Toast,
    WakeLock,
};
pub use player::Player;
pub use queue::{ChooseMode, Chosen, Queue, QueueRestore};
pub use random::RandomPool;
pub use scheduler::{DebounceKey, TimerKind};
pub use session::{PlayerProbe, Session};
pub use state::{PlaybackState, Snapshot};
pub use timeline::{Timeline, MAX_HISTORY};
pub use volume::Volume;
pub use worker::{PlaybackHandle, PlaybackService};
