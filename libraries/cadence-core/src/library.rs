//! Library lookup trait and an in-memory implementation

use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::types::{ItemKind, Track, TrackId};

/// Read access to the media library
///
/// Implementations must be cheap to call from the playback thread; they are
/// consulted on every track load and while choosing items.
pub trait Library: Send + Sync {
    /// Fetch the populated track for `id`, or `None` if the library no longer
    /// contains it.
    fn lookup(&self, id: TrackId) -> Result<Option<Track>>;

    /// Resolve an artist, album or single track into its populated tracks,
    /// in library order.
    fn resolve(&self, kind: ItemKind, id: i64) -> Result<Vec<Track>>;

    /// Every track id currently in the library.
    fn track_ids(&self) -> Result<Vec<TrackId>>;
}

/// Library backed by an in-memory track list
///
/// Used by hosts that load an index up front, and by tests.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    tracks: RwLock<Vec<Track>>,
}

impl MemoryLibrary {
    /// Create a library holding `tracks`
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: RwLock::new(tracks),
        }
    }

    /// Replace the whole content
    pub fn replace_all(&self, tracks: Vec<Track>) {
        *self.tracks.write().unwrap_or_else(PoisonError::into_inner) = tracks;
    }

    /// Add or replace a single track
    pub fn insert(&self, track: Track) {
        let mut tracks = self.tracks.write().unwrap_or_else(PoisonError::into_inner);
        match tracks.iter_mut().find(|t| t.id == track.id) {
            Some(existing) => *existing = track,
            None => tracks.push(track),
        }
    }

    /// Remove a track, returning whether it was present
    pub fn remove(&self, id: TrackId) -> bool {
        let mut tracks = self.tracks.write().unwrap_or_else(PoisonError::into_inner);
        let before = tracks.len();
        tracks.retain(|t| t.id != id);
        tracks.len() != before
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Library for MemoryLibrary {
    fn lookup(&self, id: TrackId) -> Result<Option<Track>> {
        let tracks = self.tracks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tracks.iter().find(|t| t.id == id).cloned())
    }

    fn resolve(&self, kind: ItemKind, id: i64) -> Result<Vec<Track>> {
        let tracks = self.tracks.read().unwrap_or_else(PoisonError::into_inner);
        let matches = tracks
            .iter()
            .filter(|t| match kind {
                ItemKind::Track => t.id.get() == id,
                ItemKind::Album => t.album_id.is_some_and(|a| a.get() == id),
                ItemKind::Artist => t.artist_id.is_some_and(|a| a.get() == id),
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    fn track_ids(&self) -> Result<Vec<TrackId>> {
        let tracks = self.tracks.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tracks.iter().map(|t| t.id).collect())
    }
}
