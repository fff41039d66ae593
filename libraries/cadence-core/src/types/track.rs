/// Track domain type
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::library::Library;
use crate::types::{AlbumId, ArtistId, TrackId};

/// A playable library item
///
/// A track is either id-only (as restored from persisted queue state) or
/// populated from the library. Once populated the descriptive fields are not
/// changed except by a forced re-query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Library identifier
    pub id: TrackId,

    /// Locator of the audio file
    pub path: Option<PathBuf>,

    /// Track title
    pub title: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Album grouping identifier
    pub album_id: Option<AlbumId>,

    /// Artist grouping identifier
    pub artist_id: Option<ArtistId>,

    /// Track number in album
    pub track_number: Option<u32>,

    /// Whether the track was picked by random selection rather than the user
    #[serde(default)]
    pub random: bool,
}

impl Track {
    /// Create a populated track with minimal metadata
    pub fn new(id: TrackId, path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::id_only(id)
        }
    }

    /// Create an unpopulated track holding only its identifier
    pub fn id_only(id: TrackId) -> Self {
        Self {
            id,
            path: None,
            title: None,
            album: None,
            artist: None,
            album_id: None,
            artist_id: None,
            track_number: None,
            random: false,
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the album name and grouping id
    #[must_use]
    pub fn with_album(mut self, album_id: AlbumId, album: impl Into<String>) -> Self {
        self.album_id = Some(album_id);
        self.album = Some(album.into());
        self
    }

    /// Set the artist name and grouping id
    #[must_use]
    pub fn with_artist(mut self, artist_id: ArtistId, artist: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id);
        self.artist = Some(artist.into());
        self
    }

    /// Set the track number
    #[must_use]
    pub fn with_track_number(mut self, number: u32) -> Self {
        self.track_number = Some(number);
        self
    }

    /// Whether a locator has been filled in by a lookup
    pub fn is_populated(&self) -> bool {
        self.path.is_some()
    }

    /// Audio file locator, if populated
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Identity comparison used for "did the current track change"
    pub fn same_track(&self, other: &Track) -> bool {
        self.id == other.id
    }

    /// Populate this track from the library.
    ///
    /// Skips the lookup when already populated unless `force` is set. Returns
    /// `Ok(false)` when the library no longer knows the id. Both that case and
    /// a lookup error invalidate the id to [`TrackId::NONE`].
    pub fn query(&mut self, library: &dyn Library, force: bool) -> Result<bool> {
        if !self.id.is_valid() {
            return Ok(false);
        }
        if self.is_populated() && !force {
            return Ok(true);
        }

        match library.lookup(self.id) {
            Ok(Some(found)) => {
                let random = self.random;
                *self = found;
                self.random = random;
                Ok(true)
            }
            Ok(None) => {
                self.id = TrackId::NONE;
                Ok(false)
            }
            Err(e) => {
                self.id = TrackId::NONE;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MemoryLibrary;

    fn library() -> MemoryLibrary {
        MemoryLibrary::new(vec![Track::new(TrackId::new(1), PathBuf::from("/music/a.flac"))
            .with_title("A")
            .with_album(AlbumId::new(10), "First")])
    }

    #[test]
    fn query_populates_id_only_track() {
        let mut track = Track::id_only(TrackId::new(1));
        assert!(!track.is_populated());

        assert!(track.query(&library(), false).unwrap());
        assert!(track.is_populated());
        assert_eq!(track.title.as_deref(), Some("A"));
        assert_eq!(track.album_id, Some(AlbumId::new(10)));
    }

    #[test]
    fn failed_lookup_invalidates_id() {
        let mut track = Track::id_only(TrackId::new(99));
        assert!(!track.query(&library(), false).unwrap());
        assert_eq!(track.id, TrackId::NONE);

        // Invalid ids are never looked up again
        assert!(!track.query(&library(), true).unwrap());
    }

    #[test]
    fn forced_query_keeps_random_provenance() {
        let mut track = Track::id_only(TrackId::new(1));
        track.random = true;
        track.query(&library(), true).unwrap();
        assert!(track.random);
    }

    #[test]
    fn same_track_compares_ids_only() {
        let a = Track::id_only(TrackId::new(1));
        let b = Track::new(TrackId::new(1), PathBuf::from("/x")).with_title("other");
        assert!(a.same_track(&b));
        assert_ne!(a, b);
    }
}
