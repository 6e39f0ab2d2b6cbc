//! Cooldown countdown state.

/// Countdown state of a server-declared cooldown.
///
/// ## Invariants
///
/// - `remaining_seconds <= total_seconds`
/// - `remaining_seconds == 0` means the cooldown is idle and a new purchase
///   attempt is allowed
///
/// ## Examples
///
/// ```
/// use bobs_corn_core::CooldownState;
///
/// let mut state = CooldownState::idle();
/// state.start(2);
/// assert!(!state.is_idle());
/// state.tick();
/// assert_eq!(state.remaining_seconds(), 1);
/// state.tick();
/// assert!(state.is_idle());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CooldownState {
    total_seconds: u32,
    remaining_seconds: u32,
}

impl CooldownState {
    /// An idle cooldown: nothing to wait for.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            total_seconds: 0,
            remaining_seconds: 0,
        }
    }

    /// Begin counting down from `total_seconds`.
    ///
    /// Replaces any countdown in progress; durations never accumulate.
    pub const fn start(&mut self, total_seconds: u32) {
        self.total_seconds = total_seconds;
        self.remaining_seconds = total_seconds;
    }

    /// Advance the countdown by one second, clamped at zero.
    ///
    /// Returns `true` if this tick brought the countdown to idle.
    pub const fn tick(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }

    /// Return to idle immediately.
    pub const fn reset(&mut self) {
        *self = Self::idle();
    }

    /// Duration the current countdown started from.
    #[must_use]
    pub const fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Seconds left before a new attempt is allowed.
    #[must_use]
    pub const fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Returns `true` when no countdown is running.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// Fraction of the countdown already elapsed, in `[0.0, 1.0]`.
    ///
    /// Defined as 0 while idle.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.is_idle() || self.total_seconds == 0 {
            return 0.0;
        }
        let elapsed = f64::from(self.total_seconds.saturating_sub(self.remaining_seconds));
        (elapsed / f64::from(self.total_seconds)).clamp(0.0, 1.0)
    }
}
