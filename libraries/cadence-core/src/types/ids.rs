/// ID types for library entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier
///
/// Library track ids are positive integers. A failed lookup invalidates an id
/// to [`TrackId::NONE`], so callers check [`TrackId::is_valid`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(i64);

impl TrackId {
    /// Sentinel for an invalidated or unknown track
    pub const NONE: Self = Self(-1);

    /// Create a track ID
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this id may be looked up
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TrackId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Album identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(i64);

impl AlbumId {
    /// Create an album ID
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Artist identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(i64);

impl ArtistId {
    /// Create an artist ID
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
