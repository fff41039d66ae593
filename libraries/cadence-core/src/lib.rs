//! Cadence Core
//!
//! Domain types, the library lookup trait, and error handling shared by the
//! playback controller and its hosts.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `ItemKind`
//! - **Core Traits**: `Library` (metadata lookup and item resolution)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{MemoryLibrary, Track, TrackId};
//! use std::path::PathBuf;
//!
//! let library = MemoryLibrary::new(vec![
//!     Track::new(TrackId::new(7), PathBuf::from("/music/song.flac")).with_title("Song"),
//! ]);
//!
//! let mut track = Track::id_only(TrackId::new(7));
//! assert!(track.query(&library, false).unwrap());
//! assert_eq!(track.title.as_deref(), Some("Song"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types
pub mod error;
/// Library lookup
pub mod library;
/// Domain types
pub mod types;

pub use error::{CoreError, Result};
pub use library::{Library, MemoryLibrary};
pub use types::{AlbumId, ArtistId, ItemKind, Track, TrackId};
