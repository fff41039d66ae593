//! Session resource manager
//!
//! Owns the single player, the wake lock and the notification payload. The
//! controller holds the only `Session`; readers get a [`PlayerProbe`] that
//! locks the player alone, so position queries never wait on the controller.

use cadence_core::Track;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::platform::{Notification, Presenter, WakeLock};
use crate::player::Player;

type SharedPlayer = Arc<Mutex<Box<dyn Player>>>;

fn lock(player: &SharedPlayer) -> MutexGuard<'_, Box<dyn Player>> {
    player.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only access to player position and duration
#[derive(Clone)]
pub struct PlayerProbe {
    player: SharedPlayer,
}

impl PlayerProbe {
    /// Current playback position
    pub fn position(&self) -> Duration {
        lock(&self.player).position()
    }

    /// Duration of the loaded track
    pub fn duration(&self) -> Option<Duration> {
        lock(&self.player).duration()
    }
}

impl std::fmt::Debug for PlayerProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerProbe").finish_non_exhaustive()
    }
}

/// The live audio session
pub struct Session {
    player: SharedPlayer,
    wake_lock: Box<dyn WakeLock>,
    presenter: Box<dyn Presenter>,
    notification: Option<Notification>,
    created: bool,
    prepared: bool,
    released: bool,
}

impl Session {
    /// Wrap the platform resources; nothing is acquired until [`Session::create`]
    pub fn new(
        player: Box<dyn Player>,
        wake_lock: Box<dyn WakeLock>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            player: Arc::new(Mutex::new(player)),
            wake_lock,
            presenter,
            notification: None,
            created: false,
            prepared: false,
            released: false,
        }
    }

    /// Reader handle for position and duration
    pub fn probe(&self) -> PlayerProbe {
        PlayerProbe {
            player: Arc::clone(&self.player),
        }
    }

    /// Mark resources as acquired
    pub fn create(&mut self) {
        self.created = !self.released;
    }

    /// Whether [`Session::create`] ran and release has not
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Whether a source is prepared and may be started
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Reset, set source and prepare `track`
    pub fn load(&mut self, track: &Track) -> Result<()> {
        if self.released {
            return Err(PlaybackError::Released);
        }
        let path = track.path().ok_or(PlaybackError::NoSource)?;

        self.prepared = false;
        let mut player = lock(&self.player);
        player.reset();
        player.set_source(path)?;
        player.prepare()?;
        drop(player);

        self.prepared = true;
        debug!(track_id = %track.id, "prepared track");
        Ok(())
    }

    /// Start output if a source is prepared
    pub fn start(&mut self) {
        if self.prepared {
            lock(&self.player).start();
        }
    }

    /// Pause output if a source is prepared
    pub fn pause(&mut self) {
        if self.prepared {
            lock(&self.player).pause();
        }
    }

    /// Stop output if active
    pub fn stop(&mut self) {
        if self.prepared {
            lock(&self.player).stop();
            self.prepared = false;
        }
    }

    /// Drop the current source after a failure
    pub fn reset(&mut self) {
        if self.released {
            return;
        }
        lock(&self.player).reset();
        self.prepared = false;
    }

    /// Seek within the prepared source
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if !self.prepared {
            return Ok(());
        }
        lock(&self.player).seek_to(position)
    }

    /// Seek to `per_mille` thousandths of the duration
    pub fn seek_to_progress(&mut self, per_mille: u32) -> Result<()> {
        let Some(duration) = self.duration() else {
            return Ok(());
        };
        let fraction = f64::from(per_mille.min(1000)) / 1000.0;
        self.seek(duration.mul_f64(fraction))
    }

    /// Apply an output level
    pub fn set_volume(&mut self, volume: f32) {
        if !self.released {
            lock(&self.player).set_volume(volume);
        }
    }

    /// Current position, zero when nothing is prepared
    pub fn position(&self) -> Duration {
        if self.prepared {
            lock(&self.player).position()
        } else {
            Duration::ZERO
        }
    }

    /// Duration of the prepared source
    pub fn duration(&self) -> Option<Duration> {
        if self.prepared {
            lock(&self.player).duration()
        } else {
            None
        }
    }

    /// Hold the wake lock
    pub fn acquire_wake_lock(&mut self) {
        if !self.wake_lock.is_held() {
            self.wake_lock.acquire();
        }
    }

    /// Drop the wake lock
    pub fn release_wake_lock(&mut self) {
        if self.wake_lock.is_held() {
            self.wake_lock.release();
        }
    }

    /// Presenter for toasts and UI requests
    pub fn presenter(&mut self) -> &mut dyn Presenter {
        self.presenter.as_mut()
    }

    /// Last notification built
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Store and show a notification
    pub fn notify(&mut self, notification: Notification) {
        self.presenter.notify(&notification);
        self.notification = Some(notification);
    }

    /// Remove the notification and leave the foreground
    pub fn cancel_notification(&mut self) {
        self.notification = None;
        self.presenter.stop_foreground(true);
    }

    /// Enter the foreground with the stored notification
    pub fn start_foreground(&mut self) {
        self.presenter.start_foreground(self.notification.as_ref());
    }

    /// Leave the foreground, keeping the notification
    pub fn stop_foreground(&mut self) {
        self.presenter.stop_foreground(false);
    }

    /// Free the player and every OS resource. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stop();
        lock(&self.player).release();
        self.release_wake_lock();
        self.presenter.stop_foreground(true);
        self.notification = None;
        self.created = false;
        self.released = true;
        debug!("session released");
    }

    /// Whether [`Session::release`] ran
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.released {
            warn!("session dropped without release");
            self.release();
        }
    }
}
