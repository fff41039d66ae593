//! Queue collaborator
//!
//! The controller never owns queue contents directly. It drives an ordered,
//! persistent sequence of tracks through this trait: moving the cursor,
//! choosing items, and toggling the shuffle/repeat policy.

use cadence_core::{ItemKind, Track, TrackId};
use std::time::Duration;

use crate::error::Result;

/// How chosen items enter the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooseMode {
    /// Replace everything after the cursor
    Play,
    /// Insert after the last enqueued item (or after the cursor)
    Enqueue,
}

/// Outcome of [`Queue::choose_items`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chosen {
    /// Number of tracks inserted
    pub added: usize,
    /// Offset from the cursor to the first inserted track
    pub first_offset: Option<i32>,
}

/// State restored by [`Queue::load_state`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRestore {
    /// Persisted shuffle policy
    pub shuffle: bool,
    /// Persisted repeat policy
    pub repeat: bool,
    /// Playback position to seek to after the first load
    pub position: Duration,
}

/// Ordered tracks with a cursor
pub trait Queue: Send {
    /// Restore persisted contents
    fn load_state(&mut self) -> Result<QueueRestore>;

    /// Persist contents together with the playback position
    fn save_state(&mut self, position: Duration) -> Result<()>;

    /// Track at `delta` from the cursor, without moving it
    fn get(&mut self, delta: i32) -> Option<Track>;

    /// Move the cursor by `delta` and return the track there
    fn shift_current(&mut self, delta: i32) -> Option<Track>;

    /// Change the shuffle policy
    fn set_shuffle(&mut self, shuffle: bool);

    /// Change the repeat policy
    fn set_repeat(&mut self, repeat: bool);

    /// Resolve a library item and insert its tracks
    fn choose_items(&mut self, mode: ChooseMode, kind: ItemKind, id: i64) -> Result<Chosen>;

    /// Forget the enqueue marker
    fn finish_enqueueing(&mut self);

    /// Remove every occurrence of `id`. Returns whether the current track was removed.
    fn remove(&mut self, id: TrackId) -> bool;

    /// Drop old history behind the cursor
    fn purge(&mut self);

    /// The library changed; drop anything cached from it
    fn library_changed(&mut self);

    /// Cursor index
    fn position(&self) -> usize;

    /// Number of tracks
    fn len(&self) -> usize;

    /// Whether the queue holds no tracks
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
