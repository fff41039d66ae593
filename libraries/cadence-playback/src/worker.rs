//! Controller thread
//!
//! Runs a [`Controller`] on a dedicated thread. The loop sleeps until the
//! next command or the earliest timer deadline, whichever comes first.
//! Readers talk to it through a [`PlaybackHandle`].

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::PoisonError;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::command::{Command, CommandReceiver, CommandSender};
use crate::controller::{Controller, SharedSnapshot};
use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::session::PlayerProbe;
use crate::state::{PlaybackState, Snapshot};

const THREAD_NAME: &str = "playback-controller";

/// Cloneable client view of a running controller
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    commands: CommandSender,
    snapshot: SharedSnapshot,
    probe: PlayerProbe,
    events: EventBus,
}

impl PlaybackHandle {
    /// Post a command
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command)
    }

    /// Sender for event sources and other producers
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Last committed snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last committed flags
    pub fn state(&self) -> PlaybackState {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Playback position, read straight from the player
    pub fn position(&self) -> Duration {
        self.probe.position()
    }

    /// Duration of the loaded track
    pub fn duration(&self) -> Option<Duration> {
        self.probe.duration()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// Owns the controller thread
pub struct PlaybackService {
    handle: PlaybackHandle,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackService {
    /// Move `controller` onto its own thread, consuming commands from `inbox`
    pub fn spawn(controller: Controller, inbox: CommandReceiver) -> Result<Self> {
        let handle = PlaybackHandle {
            commands: controller.command_sender(),
            snapshot: controller.snapshot(),
            probe: controller.probe(),
            events: controller.events(),
        };

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(controller, &inbox))?;

        info!("playback controller thread started");
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Client handle
    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    /// Send [`Command::Shutdown`] and wait for the thread to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // The thread may already be gone if shutdown arrived some other way
        let _ = self.handle.send(Command::Shutdown);
        thread.join().map_err(|_| PlaybackError::WorkerPanicked)
    }
}

impl Drop for PlaybackService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "failed to stop playback controller");
        }
    }
}

fn run(mut controller: Controller, inbox: &CommandReceiver) {
    loop {
        controller.run_due(Instant::now());
        if controller.is_shut_down() {
            break;
        }

        match inbox.recv_until(controller.next_deadline()) {
            Ok(command) => controller.handle(command, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("command channel closed");
                controller.handle(Command::Shutdown, Instant::now());
                break;
            }
        }
    }
    info!("playback controller thread stopped");
}
