//! User volume and idle fade-out
//!
//! The controller keeps two levels: the volume the user chose and the volume
//! currently applied to the player. They only differ while a fade is running.
//! The fade curve is quartic so that most of the drop happens near the end.

/// Number of fade ticks from full volume to silence
pub const FADE_STEPS: u8 = 100;

/// Floor for the faded volume; the player is paused rather than muted
pub const MIN_FADE_VOLUME: f32 = 0.01;

/// User and applied volume
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    user: f32,
    current: f32,
}

impl Volume {
    /// Create at the given user level (0.0 to 1.0)
    pub fn new(user: f32) -> Self {
        let user = user.clamp(0.0, 1.0);
        Self {
            user,
            current: user,
        }
    }

    /// Level the user chose
    pub fn user(&self) -> f32 {
        self.user
    }

    /// Level currently applied to the player
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Change the user level; this also ends any fade. Returns the level to apply.
    pub fn set_user(&mut self, user: f32) -> f32 {
        self.user = user.clamp(0.0, 1.0);
        self.current = self.user;
        self.current
    }

    /// Move the applied level to a fade step. Returns the level to apply.
    ///
    /// `progress` counts down from [`FADE_STEPS`] to 0.
    pub fn fade_to(&mut self, progress: u8) -> f32 {
        self.current = fade_level(self.user, progress);
        self.current
    }

    /// Return to the user level. Returns the level to apply.
    pub fn restore(&mut self) -> f32 {
        self.current = self.user;
        self.current
    }

    /// Whether a fade has lowered the applied level
    pub fn is_faded(&self) -> bool {
        self.current != self.user
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Applied level for a fade step: `max(user * (p/100)^4, 0.01)`
pub fn fade_level(user: f32, progress: u8) -> f32 {
    let ratio = f32::from(progress.min(FADE_STEPS)) / f32::from(FADE_STEPS);
    (user * ratio.powi(4)).max(MIN_FADE_VOLUME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_volume_is_not_faded() {
        let volume = Volume::new(0.8);
        assert_eq!(volume.user(), 0.8);
        assert_eq!(volume.current(), 0.8);
        assert!(!volume.is_faded());
    }

    #[test]
    fn fade_curve_is_quartic_with_floor() {
        assert!((fade_level(1.0, 100) - 1.0).abs() < f32::EPSILON);
        assert!((fade_level(1.0, 50) - 0.0625).abs() < 1e-6);
        assert!((fade_level(0.5, 50) - 0.03125).abs() < 1e-6);
        assert_eq!(fade_level(1.0, 5), MIN_FADE_VOLUME);
        assert_eq!(fade_level(1.0, 0), MIN_FADE_VOLUME);
    }

    #[test]
    fn fade_is_monotonic() {
        let mut last = f32::MAX;
        for progress in (0..=FADE_STEPS).rev() {
            let level = fade_level(1.0, progress);
            assert!(level <= last);
            last = level;
        }
    }

    #[test]
    fn restore_undoes_fade() {
        let mut volume = Volume::new(0.9);
        volume.fade_to(40);
        assert!(volume.is_faded());
        assert_eq!(volume.restore(), 0.9);
        assert!(!volume.is_faded());
    }

    #[test]
    fn set_user_clamps_and_ends_fade() {
        let mut volume = Volume::new(1.0);
        volume.fade_to(10);
        assert_eq!(volume.set_user(3.0), 1.0);
        assert!(!volume.is_faded());
    }
}
