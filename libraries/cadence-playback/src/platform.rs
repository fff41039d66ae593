//! Platform capabilities
//!
//! Everything the controller needs from its host is expressed as a strategy
//! trait chosen at construction: output routing, foreground presentation,
//! wake locks, scrobbling and the event sources that post commands.

use cadence_core::Track;
use serde::{Deserialize, Serialize};

use crate::command::CommandSender;
use crate::error::Result;

/// Where audio is currently routed
pub trait OutputRoute: Send {
    /// Whether a wired headset is attached
    fn is_plugged(&self) -> bool;

    /// Whether the built-in speaker would be used, ignoring wired headsets.
    /// Bluetooth or other alternate outputs count as "not the speaker".
    fn is_speaker_on(&self) -> bool;
}

/// Payload of the persistent "now playing" notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Track being presented
    pub track: Track,
    /// Whether playback is running
    pub playing: bool,
}

/// Short transient messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toast {
    /// A command arrived before initialization finished
    Starting,
    /// Shuffle turned on
    ShuffleOn,
    /// Shuffle turned off
    ShuffleOff,
    /// Repeat turned on
    RepeatOn,
    /// Repeat turned off
    RepeatOff,
}

impl Toast {
    /// User-facing text
    pub fn message(self) -> &'static str {
        match self {
            Self::Starting => "Starting up...",
            Self::ShuffleOn => "Shuffle enabled",
            Self::ShuffleOff => "Shuffle disabled",
            Self::RepeatOn => "Repeat enabled",
            Self::RepeatOff => "Repeat disabled",
        }
    }
}

/// Foreground presentation and user-facing feedback
pub trait Presenter: Send {
    /// Enter foreground mode, showing `notification` if one exists
    fn start_foreground(&mut self, notification: Option<&Notification>);

    /// Leave foreground mode, optionally removing the notification
    fn stop_foreground(&mut self, remove_notification: bool);

    /// Show or refresh the notification
    fn notify(&mut self, notification: &Notification);

    /// Show a transient message
    fn toast(&mut self, toast: Toast);

    /// Bring the full UI to the foreground
    fn launch_ui(&mut self);
}

/// Keeps the device awake across a track transition
pub trait WakeLock: Send {
    /// Take the lock
    fn acquire(&mut self);

    /// Drop the lock if held
    fn release(&mut self);

    /// Whether the lock is held
    fn is_held(&self) -> bool;
}

/// Receives playback status for listening-history services
pub trait Scrobbler: Send {
    /// Report the committed status
    fn submit(&mut self, playing: bool, track: Option<&Track>);
}

/// Categories of event sources, attached and detached as groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Headset plug listener
    Route,
    /// Telephony listener
    Call,
    /// Hardware media button receiver
    MediaButton,
    /// Library content observer, attached only while there is no media
    Library,
}

/// A listener that posts [`crate::Command`]s when something happens outside
///
/// Attach and detach are idempotent from the controller's view; it never
/// attaches a kind twice without detaching it in between.
pub trait EventSource: Send {
    /// Which group this source belongs to
    fn kind(&self) -> SourceKind;

    /// Start listening, posting into `commands`
    fn attach(&mut self, commands: CommandSender) -> Result<()>;

    /// Stop listening
    fn detach(&mut self) -> Result<()>;
}

/// Host capabilities handed to the controller
pub struct Platform {
    /// Output routing
    pub route: Box<dyn OutputRoute>,
    /// Optional scrobbler, used when scrobbling is enabled
    pub scrobbler: Option<Box<dyn Scrobbler>>,
    /// Event sources of every kind
    pub sources: Vec<Box<dyn EventSource>>,
}

impl Platform {
    /// Platform with only a route; no scrobbler or sources
    pub fn new(route: Box<dyn OutputRoute>) -> Self {
        Self {
            route,
            scrobbler: None,
            sources: Vec::new(),
        }
    }

    /// Add a scrobbler
    #[must_use]
    pub fn with_scrobbler(mut self, scrobbler: Box<dyn Scrobbler>) -> Self {
        self.scrobbler = Some(scrobbler);
        self
    }

    /// Add an event source
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn EventSource>) -> Self {
        self.sources.push(source);
        self
    }
}
