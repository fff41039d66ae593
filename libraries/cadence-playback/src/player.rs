//! Platform-agnostic player trait
//!
//! Abstracts the single decoder/output handle. The controller drives it
//! through the state machine idle → prepared → started/paused → stopped and
//! learns about asynchronous completion or failure through posted
//! [`crate::Command::TrackCompleted`] and [`crate::Command::DecoderError`].

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// Opaque decoder/output resource
///
/// Implementors own whatever the platform uses to make sound. Calls arrive
/// from the controller thread only, except `position` and `duration`, which
/// readers may call through a [`crate::PlayerProbe`].
pub trait Player: Send {
    /// Return to the idle state, dropping any source
    fn reset(&mut self);

    /// Point the player at an audio file
    ///
    /// # Returns
    /// * `Err(_)` - The file could not be opened
    fn set_source(&mut self, path: &Path) -> Result<()>;

    /// Decode enough to start playback immediately
    ///
    /// # Returns
    /// * `Err(_)` - The source is not playable
    fn prepare(&mut self) -> Result<()>;

    /// Start or resume output
    fn start(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Stop output; the player must be prepared again before starting
    fn stop(&mut self);

    /// Seek to position in track
    fn seek_to(&mut self, position: Duration) -> Result<()>;

    /// Set output level (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Get current playback position
    fn position(&self) -> Duration;

    /// Get total track duration, if known
    fn duration(&self) -> Option<Duration>;

    /// Free the underlying resource; the player is not used afterwards
    fn release(&mut self);
}
