/// Kinds of library items that can be played or enqueued
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Library item kind used by play/enqueue requests
///
/// The numeric codes are part of the external command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Every track by an artist
    Artist,
    /// Every track on an album
    Album,
    /// A single track
    Track,
}

impl ItemKind {
    /// Numeric code of this kind
    pub const fn code(self) -> i32 {
        match self {
            Self::Artist => 1,
            Self::Album => 2,
            Self::Track => 3,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Track => "track",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "artist" => Some(Self::Artist),
            "album" => Some(Self::Album),
            "track" => Some(Self::Track),
            _ => None,
        }
    }
}

impl TryFrom<i32> for ItemKind {
    type Error = CoreError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Artist),
            2 => Ok(Self::Album),
            3 => Ok(Self::Track),
            other => Err(CoreError::InvalidItemKind(other)),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
