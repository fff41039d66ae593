//! Playback Events
//!
//! Change notifications fanned out to every subscriber. Events are emitted
//! from the controller thread only:
//! - State changes (flags or current track)
//! - Optimistic track replacement ahead of a skip
//! - Initialization finished

use cadence_core::Track;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use crate::state::PlaybackState;

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Committed state or current track changed
    StateChanged {
        /// Committed flags
        state: PlaybackState,
        /// Track at the cursor
        track: Option<Track>,
        /// Cursor position
        position: usize,
    },

    /// The track at `offset` from the cursor is about to change
    TrackReplaced {
        /// Offset relative to the cursor
        offset: i32,
        /// The replacing track
        track: Option<Track>,
    },

    /// Resources acquired and the first track loaded
    Initialized,
}

/// Fan-out of [`PlaybackEvent`]s to any number of subscribers
///
/// Disconnected subscribers are dropped on the next emit.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlaybackEvent>>>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber
    pub fn emit(&self, event: &PlaybackEvent) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<PlaybackEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit(&PlaybackEvent::Initialized);

        assert_eq!(a.try_recv().unwrap(), PlaybackEvent::Initialized);
        assert_eq!(b.try_recv().unwrap(), PlaybackEvent::Initialized);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(&PlaybackEvent::Initialized);
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn events_serialize() {
        let event = PlaybackEvent::StateChanged {
            state: PlaybackState::PLAYING | PlaybackState::SHUFFLE,
            track: None,
            position: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["StateChanged"]["state"], 5);
        assert_eq!(json["StateChanged"]["position"], 3);
    }
}
