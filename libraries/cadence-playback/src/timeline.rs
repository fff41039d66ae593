//! In-memory queue with optional persistence
//!
//! `Timeline` is the stock [`Queue`]: a flat list of populated tracks and a
//! cursor. Chosen items are inserted after the cursor; history before the
//! cursor is kept up to [`MAX_HISTORY`] entries. When the end is reached with
//! repeat off, an optional [`RandomPool`] keeps playback going with random
//! library tracks.
//!
//! ```text
//!   history        cursor      upcoming
//! [ t1  t2  t3 ] [  t4  ] [ t5  t6 | t7  t8 ]
//!                                   ^ enqueue marker
//! ```

use cadence_core::{ItemKind, Library, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::queue::{ChooseMode, Chosen, Queue, QueueRestore};
use crate::random::{shuffle_tracks, sort_album_order, RandomPool};

/// History entries kept behind the cursor by [`Queue::purge`]
pub const MAX_HISTORY: usize = 10;

/// On-disk form of a timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TimelineState {
    tracks: Vec<TrackId>,
    current: usize,
    shuffle: bool,
    repeat: bool,
    position_ms: u64,
}

/// Flat queue of tracks with a cursor
pub struct Timeline {
    library: Arc<dyn Library>,
    tracks: Vec<Track>,
    current: usize,
    enqueue_marker: Option<usize>,
    shuffle: bool,
    repeat: bool,
    random: Option<RandomPool>,
    state_file: Option<PathBuf>,
}

impl Timeline {
    /// Create an empty timeline over `library`
    pub fn new(library: Arc<dyn Library>) -> Self {
        Self {
            library,
            tracks: Vec::new(),
            current: 0,
            enqueue_marker: None,
            shuffle: false,
            repeat: false,
            random: None,
            state_file: None,
        }
    }

    /// Persist to and restore from `path`
    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Keep playing random library tracks once the queue runs out
    #[must_use]
    pub fn with_random_fill(mut self, pool: RandomPool) -> Self {
        self.random = Some(pool);
        self
    }

    /// Tracks in order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Whether shuffle is on
    pub fn is_shuffling(&self) -> bool {
        self.shuffle
    }

    /// Whether repeat is on
    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    /// Index for `delta` from the cursor, growing the list from the random
    /// pool when needed.
    fn resolve_index(&mut self, delta: i32) -> Option<usize> {
        let target = self.current as i64 + i64::from(delta);
        let len = self.tracks.len() as i64;

        if target < 0 {
            // Backwards past the start replays the first track
            return if len == 0 {
                None
            } else if self.repeat {
                Some(target.rem_euclid(len) as usize)
            } else {
                Some(0)
            };
        }
        if target < len {
            return Some(target as usize);
        }
        if self.repeat && len > 0 {
            return Some(target.rem_euclid(len) as usize);
        }

        let pool = self.random.as_mut()?;
        while (self.tracks.len() as i64) <= target {
            let track = pool.next(self.library.as_ref())?;
            debug!(track_id = %track.id, "appending random track");
            self.tracks.push(track);
        }
        Some(target as usize)
    }

    fn read_state(&self) -> Result<Option<TimelineState>> {
        let Some(path) = &self.state_file else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let state = serde_json::from_str(&content)
            .map_err(|e| PlaybackError::Persistence(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }
}

impl Queue for Timeline {
    fn load_state(&mut self) -> Result<QueueRestore> {
        let Some(state) = self.read_state()? else {
            return Ok(QueueRestore::default());
        };

        let mut tracks = Vec::with_capacity(state.tracks.len());
        let mut current = state.current;
        for (index, id) in state.tracks.into_iter().enumerate() {
            let mut track = Track::id_only(id);
            match track.query(self.library.as_ref(), false) {
                Ok(true) => tracks.push(track),
                Ok(false) | Err(_) => {
                    debug!(track_id = %id, "dropping vanished track from restored queue");
                    if index < state.current {
                        current = current.saturating_sub(1);
                    }
                }
            }
        }

        self.current = current.min(tracks.len().saturating_sub(1));
        self.tracks = tracks;
        self.enqueue_marker = None;
        self.shuffle = state.shuffle;
        self.repeat = state.repeat;
        info!(tracks = self.tracks.len(), current = self.current, "restored queue");

        Ok(QueueRestore {
            shuffle: state.shuffle,
            repeat: state.repeat,
            position: Duration::from_millis(state.position_ms),
        })
    }

    fn save_state(&mut self, position: Duration) -> Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let state = TimelineState {
            tracks: self.tracks.iter().map(|t| t.id).collect(),
            current: self.current,
            shuffle: self.shuffle,
            repeat: self.repeat,
            position_ms: position.as_millis() as u64,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&state)?)?;
        debug!(path = %path.display(), "saved queue state");
        Ok(())
    }

    fn get(&mut self, delta: i32) -> Option<Track> {
        let index = self.resolve_index(delta)?;
        self.tracks.get(index).cloned()
    }

    fn shift_current(&mut self, delta: i32) -> Option<Track> {
        let index = self.resolve_index(delta)?;
        self.current = index;
        self.tracks.get(index).cloned()
    }

    fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    fn choose_items(&mut self, mode: ChooseMode, kind: ItemKind, id: i64) -> Result<Chosen> {
        let mut items = self.library.resolve(kind, id)?;
        items.retain(|t| t.id.is_valid());
        if items.is_empty() {
            warn!(%kind, id, "nothing to choose");
            return Ok(Chosen::default());
        }

        if self.shuffle {
            shuffle_tracks(&mut items);
        } else {
            sort_album_order(&mut items);
        }

        let added = items.len();
        let offset = match mode {
            ChooseMode::Play => {
                self.enqueue_marker = None;
                if self.tracks.is_empty() {
                    self.tracks = items;
                    self.current = 0;
                    0
                } else {
                    self.tracks.truncate(self.current + 1);
                    self.tracks.extend(items);
                    1
                }
            }
            ChooseMode::Enqueue => {
                let default_at = if self.tracks.is_empty() {
                    0
                } else {
                    self.current + 1
                };
                // A marker the cursor has already passed is stale
                let at = match self.enqueue_marker {
                    Some(marker) if marker > self.current => marker,
                    _ => default_at,
                }
                .min(self.tracks.len());
                self.tracks.splice(at..at, items);
                self.enqueue_marker = Some(at + added);
                at as i32 - self.current as i32
            }
        };

        debug!(%kind, id, added, ?mode, "chose items");
        Ok(Chosen {
            added,
            first_offset: Some(offset),
        })
    }

    fn finish_enqueueing(&mut self) {
        self.enqueue_marker = None;
    }

    fn remove(&mut self, id: TrackId) -> bool {
        let was_current = self.tracks.get(self.current).is_some_and(|t| t.id == id);
        let removed_before = self.tracks[..self.current.min(self.tracks.len())]
            .iter()
            .filter(|t| t.id == id)
            .count();
        if let Some(marker) = self.enqueue_marker {
            let before_marker = self.tracks[..marker.min(self.tracks.len())]
                .iter()
                .filter(|t| t.id == id)
                .count();
            self.enqueue_marker = Some(marker - before_marker);
        }

        self.tracks.retain(|t| t.id != id);
        self.current = self
            .current
            .saturating_sub(removed_before)
            .min(self.tracks.len().saturating_sub(1));
        was_current
    }

    fn purge(&mut self) {
        if self.current <= MAX_HISTORY {
            return;
        }
        let excess = self.current - MAX_HISTORY;
        self.tracks.drain(..excess);
        self.current -= excess;
        self.enqueue_marker = self.enqueue_marker.map(|m| m.saturating_sub(excess));
        debug!(excess, "pruned queue history");
    }

    fn library_changed(&mut self) {
        if let Some(pool) = self.random.as_mut() {
            pool.reset();
        }
    }

    fn position(&self) -> usize {
        self.current
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}
