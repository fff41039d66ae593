//! Playback state flags
//!
//! The controller's authoritative state is a small bitset. Every change goes
//! through a single commit point in the controller, which canonicalizes the
//! requested bits before storing them. Other threads only ever see copies.

use cadence_core::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitset of independent playback flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackState(u8);

impl PlaybackState {
    /// Audio is (or should be) audible
    pub const PLAYING: Self = Self(0x1);
    /// The queue has nothing playable
    pub const NO_MEDIA: Self = Self(0x2);
    /// The queue chooses items in random order
    pub const SHUFFLE: Self = Self(0x4);
    /// The queue wraps around at its end
    pub const REPEAT: Self = Self(0x8);

    /// Every known flag
    pub const ALL: Self = Self(0x1 | 0x2 | 0x4 | 0x8);
    /// Flags a user toggles directly; changing any of them counts as activity
    pub const USER_MASK: Self = Self(0x1 | 0x4 | 0x8);

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from raw bits, dropping unknown ones
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set or clear the bits of `other`
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Copy with the bits of `other` cleared
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Only the bits shared with `mask`
    #[must_use]
    pub const fn masked(self, mask: Self) -> Self {
        Self(self.0 & mask.0)
    }

    /// Bits that differ between the two states
    #[must_use]
    pub const fn changed(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    /// Convenience for `contains(PLAYING)`
    pub const fn is_playing(self) -> bool {
        self.contains(Self::PLAYING)
    }
}

impl BitOr for PlaybackState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PlaybackState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::PLAYING, "playing"),
            (Self::NO_MEDIA, "no-media"),
            (Self::SHUFFLE, "shuffle"),
            (Self::REPEAT, "repeat"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "idle")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// Read-only copy of the controller state for other threads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Committed flags
    pub state: PlaybackState,
    /// Track at the queue cursor
    pub track: Option<Track>,
    /// Cursor position within the queue
    pub position: usize,
    /// Whether initialization has finished
    pub initialized: bool,
}
