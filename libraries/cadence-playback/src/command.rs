//! Commands accepted by the playback controller
//!
//! Every event source, timer and external client talks to the controller by
//! posting one of these values into its single queue. Commands are immutable;
//! nothing outside the controller thread touches controller state.

use cadence_core::{ItemKind, TrackId};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ConfigChange;
use crate::error::{PlaybackError, Result};
use crate::state::PlaybackState;

/// Telephony state reported by the call listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call
    Idle,
    /// Incoming call ringing
    Ringing,
    /// Call in progress
    OffHook,
}

/// Command for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Toggle play/pause
    TogglePlayback,
    /// Toggle play/pause after the debounce window; a repeat opens the UI
    TogglePlaybackDelayed,
    /// Skip to next track
    Next,
    /// Skip to next after the debounce window; a repeat opens the UI
    NextDelayed,
    /// Skip to next track and start playing
    NextAutoplay,
    /// Go back one track
    Previous,
    /// Go back one track and start playing
    PreviousAutoplay,
    /// Replace the upcoming items and play the first of them
    PlayItems {
        /// Item kind
        kind: ItemKind,
        /// Library id of the item
        id: i64,
    },
    /// Append items after the last enqueued one
    EnqueueItems {
        /// Item kind
        kind: ItemKind,
        /// Library id of the item
        id: i64,
    },
    /// Reset the enqueue marker
    FinishEnqueueing,
    /// Remove every occurrence of a track from the queue
    Remove(TrackId),
    /// Request flags to be set
    SetFlag(PlaybackState),
    /// Request flags to be cleared
    ClearFlag(PlaybackState),
    /// Request the opposite of the current value of a flag
    ToggleFlag(PlaybackState),
    /// Seek to a proportion of the track, in thousandths
    SeekToProgress(u32),
    /// Wired headset plugged or unplugged
    RouteChanged {
        /// Whether a headset is now attached
        plugged: bool,
    },
    /// Telephony state changed
    CallStateChanged(CallState),
    /// Library content changed
    LibraryChanged,
    /// The player reached the end of the current track
    TrackCompleted,
    /// The player failed while playing
    DecoderError {
        /// Backend error code
        what: i32,
        /// Backend detail code
        extra: i32,
    },
    /// A preference changed
    UpdateConfig(ConfigChange),
    /// Release everything and stop the controller thread
    Shutdown,
}

/// Cloneable handle for posting [`Command`]s
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Post a command
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| PlaybackError::ChannelClosed)
    }
}

/// Receiving end consumed by the controller thread
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<Command>,
}

impl CommandReceiver {
    /// Wait for a command until `deadline` (or forever)
    pub(crate) fn recv_until(
        &self,
        deadline: Option<Instant>,
    ) -> std::result::Result<Command, RecvTimeoutError> {
        match deadline {
            Some(deadline) => self.rx.recv_deadline(deadline),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        }
    }

    /// Take a command if one is waiting
    pub fn try_recv(&self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

/// Create the controller's command queue
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = unbounded();
    (CommandSender { tx }, CommandReceiver { rx })
}
