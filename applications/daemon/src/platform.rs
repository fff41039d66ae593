//! Host capabilities for a headless desktop process
//!
//! There is no notification tray or telephony stack here, so presentation
//! goes to the log and the interruption sources are [`Signal`]s fired from
//! the console.

use cadence_core::Track;
use cadence_playback::{
    Command, CommandSender, EventSource, Notification, OutputRoute, Presenter, Scrobbler,
    SourceKind, Toast, WakeLock,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

fn describe(track: &Track) -> String {
    match (&track.artist, &track.title) {
        (Some(artist), Some(title)) => format!("{artist} - {title}"),
        (None, Some(title)) => title.clone(),
        _ => format!("track {}", track.id),
    }
}

// ===== Presentation =====

/// Writes notifications and toasts to the log
#[derive(Debug, Default)]
pub struct LogPresenter {
    foreground: bool,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }
}

impl Presenter for LogPresenter {
    fn start_foreground(&mut self, notification: Option<&Notification>) {
        self.foreground = true;
        match notification {
            Some(n) => info!(track = %describe(&n.track), playing = n.playing, "Now playing"),
            None => debug!("Entered foreground"),
        }
    }

    fn stop_foreground(&mut self, remove_notification: bool) {
        self.foreground = false;
        debug!(remove_notification, "Left foreground");
    }

    fn notify(&mut self, notification: &Notification) {
        info!(
            track = %describe(&notification.track),
            playing = notification.playing,
            "Now playing"
        );
    }

    fn toast(&mut self, toast: Toast) {
        info!("{}", toast.message());
    }

    fn launch_ui(&mut self) {
        info!("No interface to launch; use the console");
    }
}

/// Reports listening status to the log
#[derive(Debug, Default)]
pub struct LogScrobbler;

impl Scrobbler for LogScrobbler {
    fn submit(&mut self, playing: bool, track: Option<&Track>) {
        match track {
            Some(track) => info!(playing, track = %describe(track), "Scrobble"),
            None => info!(playing, "Scrobble"),
        }
    }
}

/// Process-level wake lock
///
/// A desktop process does not sleep mid-transition, so this only tracks the
/// hold for diagnostics.
#[derive(Debug, Default)]
pub struct ProcessWakeLock {
    held: bool,
}

impl WakeLock for ProcessWakeLock {
    fn acquire(&mut self) {
        if !self.held {
            debug!("Wake lock acquired");
        }
        self.held = true;
    }

    fn release(&mut self) {
        if self.held {
            debug!("Wake lock released");
        }
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

// ===== Output Route =====

/// Route read from configuration and console plug events
#[derive(Debug, Clone)]
pub struct ConfiguredRoute {
    plugged: Arc<AtomicBool>,
    external_output: bool,
}

impl ConfiguredRoute {
    pub fn new(plugged: bool, external_output: bool) -> Self {
        Self {
            plugged: Arc::new(AtomicBool::new(plugged)),
            external_output,
        }
    }

    pub fn set_plugged(&self, plugged: bool) {
        self.plugged.store(plugged, Ordering::SeqCst);
    }
}

impl OutputRoute for ConfiguredRoute {
    fn is_plugged(&self) -> bool {
        self.plugged.load(Ordering::SeqCst)
    }

    fn is_speaker_on(&self) -> bool {
        !self.external_output
    }
}

// ===== Signal Sources =====

/// Firing end of a [`SignalSource`]
///
/// Holds the controller's sender only while the source is attached.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    sender: Arc<Mutex<Option<CommandSender>>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post `command` if the source is attached
    ///
    /// # Returns
    /// * `true` - The command was queued
    /// * `false` - The source is detached or the controller is gone
    pub fn post(&self, command: Command) -> bool {
        let sender = self.lock();
        match sender.as_ref() {
            Some(tx) => match tx.send(command) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping signal: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    fn set(&self, sender: Option<CommandSender>) {
        *self.lock() = sender;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CommandSender>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Event source whose events are fired by hand through a [`Signal`]
#[derive(Debug)]
pub struct SignalSource {
    kind: SourceKind,
    signal: Signal,
}

impl SignalSource {
    /// Create a source of `kind` and the signal that fires it
    pub fn new(kind: SourceKind) -> (Self, Signal) {
        let signal = Signal::new();
        (
            Self {
                kind,
                signal: signal.clone(),
            },
            signal,
        )
    }
}

impl EventSource for SignalSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn attach(&mut self, commands: CommandSender) -> cadence_playback::Result<()> {
        debug!(kind = ?self.kind, "Attached signal source");
        self.signal.set(Some(commands));
        Ok(())
    }

    fn detach(&mut self) -> cadence_playback::Result<()> {
        debug!(kind = ?self.kind, "Detached signal source");
        self.signal.set(None);
        Ok(())
    }
}
