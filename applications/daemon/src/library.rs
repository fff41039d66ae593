//! Track index backed by a JSON file
//!
//! The index is a document of the form `{"tracks": [...]}` where every entry
//! is a serialized [`Track`]. Relative `path` values are resolved against the
//! directory holding the index.

use cadence_core::{ItemKind, Library, MemoryLibrary, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::error::{DaemonError, Result};

#[derive(Debug, Default, Deserialize, Serialize)]
struct IndexFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Library read from an index file and reloaded on demand
#[derive(Debug)]
pub struct IndexLibrary {
    path: PathBuf,
    inner: MemoryLibrary,
    modified: Mutex<Option<SystemTime>>,
}

impl IndexLibrary {
    /// Load the index at `path`; a missing file yields an empty library
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let library = Self {
            path: path.into(),
            inner: MemoryLibrary::default(),
            modified: Mutex::new(None),
        };
        library.reload()?;
        Ok(library)
    }

    /// Index file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of indexed tracks
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Reload if the file changed since the last load
    ///
    /// # Returns
    /// * `Ok(true)` - The index was reloaded
    /// * `Ok(false)` - The file is unchanged
    pub fn refresh(&self) -> Result<bool> {
        let current = modified_time(&self.path);
        if current == *self.lock_modified() {
            debug!(path = %self.path.display(), "Library index unchanged");
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    fn reload(&self) -> Result<()> {
        let modified = modified_time(&self.path);

        let tracks = if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            let index: IndexFile = serde_json::from_str(&content).map_err(|e| {
                DaemonError::Index(format!("{}: {}", self.path.display(), e))
            })?;
            index.tracks
        } else {
            warn!(path = %self.path.display(), "Library index not found, starting empty");
            Vec::new()
        };

        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        let tracks: Vec<Track> = tracks
            .into_iter()
            .map(|mut track| {
                track.path = track.path.map(|p| resolve(base, p));
                track
            })
            .collect();

        info!(path = %self.path.display(), tracks = tracks.len(), "Loaded library index");
        self.inner.replace_all(tracks);
        *self.lock_modified() = modified;
        Ok(())
    }

    fn lock_modified(&self) -> std::sync::MutexGuard<'_, Option<SystemTime>> {
        self.modified.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Library for IndexLibrary {
    fn lookup(&self, id: TrackId) -> cadence_core::Result<Option<Track>> {
        self.inner.lookup(id)
    }

    fn resolve(&self, kind: ItemKind, id: i64) -> cadence_core::Result<Vec<Track>> {
        self.inner.resolve(kind, id)
    }

    fn track_ids(&self) -> cadence_core::Result<Vec<TrackId>> {
        self.inner.track_ids()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_the_index_directory() {
        let base = Path::new("/srv/music");
        assert_eq!(
            resolve(base, PathBuf::from("a/b.flac")),
            PathBuf::from("/srv/music/a/b.flac")
        );
        assert_eq!(
            resolve(base, PathBuf::from("/abs/c.flac")),
            PathBuf::from("/abs/c.flac")
        );
    }

    #[test]
    fn missing_tracks_key_is_an_empty_index() {
        let index: IndexFile = serde_json::from_str("{}").unwrap();
        assert!(index.tracks.is_empty());
    }
}
