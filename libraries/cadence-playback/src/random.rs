//! Random selection
//!
//! Two things live here: ordering of freshly chosen items while shuffle is
//! on, and the pool that supplies random library tracks once the queue runs
//! out.

use cadence_core::{Library, Track, TrackId};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Tracks fetched from the library per refill
pub const RANDOM_BATCH_SIZE: usize = 20;

/// Pure random shuffle using Fisher-Yates
pub fn shuffle_tracks(tracks: &mut [Track]) {
    tracks.shuffle(&mut thread_rng());
}

/// Album order: group by album, then by track number. Stable, so library order
/// is kept for ties.
pub fn sort_album_order(tracks: &mut [Track]) {
    tracks.sort_by_key(|t| (t.album_id, t.track_number));
}

/// Supplier of random library tracks
///
/// Ids are drawn from one shuffled pass over the library, so no track repeats
/// until every track has been offered. Tracks are looked up in batches.
#[derive(Debug)]
pub struct RandomPool {
    batch_size: usize,
    remaining: Vec<TrackId>,
    ready: VecDeque<Track>,
}

impl RandomPool {
    /// Create a pool that fetches `batch_size` tracks per refill
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            remaining: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    /// Next random track, marked as randomly selected
    pub fn next(&mut self, library: &dyn Library) -> Option<Track> {
        if self.ready.is_empty() {
            self.refill(library);
        }
        self.ready.pop_front()
    }

    /// Forget everything cached from the library
    pub fn reset(&mut self) {
        self.remaining.clear();
        self.ready.clear();
    }

    /// Tracks looked up and waiting
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    fn refill(&mut self, library: &dyn Library) {
        if self.remaining.is_empty() {
            match library.track_ids() {
                Ok(mut ids) => {
                    ids.shuffle(&mut thread_rng());
                    self.remaining = ids;
                }
                Err(e) => {
                    warn!(error = %e, "failed to list library for random selection");
                    return;
                }
            }
        }

        let take = self.batch_size.min(self.remaining.len());
        let batch = self.remaining.split_off(self.remaining.len() - take);
        for id in batch {
            match library.lookup(id) {
                Ok(Some(mut track)) => {
                    track.random = true;
                    self.ready.push_back(track);
                }
                Ok(None) => debug!(track_id = %id, "random pick vanished from library"),
                Err(e) => warn!(track_id = %id, error = %e, "random pick lookup failed"),
            }
        }
    }
}

impl Default for RandomPool {
    fn default() -> Self {
        Self::new(RANDOM_BATCH_SIZE)
    }
}
