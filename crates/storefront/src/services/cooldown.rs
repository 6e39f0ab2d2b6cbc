//! Cooldown countdown clock.
//!
//! [`CooldownTimer`] owns the [`CooldownState`] and knows how to schedule the
//! once-per-second ticks that drive it. Scheduling is explicit: [`CooldownTimer::start`]
//! spawns one task that sends [`Tick`]s into the caller's event channel and
//! returns a [`TickHandle`] that cancels the task when cancelled or dropped.
//!
//! Ticks carry the generation of the `start` call that scheduled them, so a
//! tick already queued from a superseded schedule is recognised and ignored.

use std::time::Duration;

use bobs_corn_core::CooldownState;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One tick of a countdown schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    generation: u64,
}

/// What a tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a superseded schedule or the timer is idle.
    Stale,
    /// Still counting down.
    Counting {
        /// Seconds left after this tick.
        remaining_seconds: u32,
    },
    /// This tick brought the countdown to zero.
    Expired,
}

/// Cancellable handle to a running tick schedule.
///
/// Dropping the handle cancels the schedule.
#[derive(Debug)]
#[must_use = "dropping a TickHandle cancels its schedule"]
pub struct TickHandle {
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// A handle with nothing scheduled.
    const fn inert() -> Self {
        Self { task: None }
    }

    /// Stop the schedule. No further ticks are sent.
    pub fn cancel(mut self) {
        self.abort();
    }

    /// Returns `true` while the schedule may still send ticks.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Countdown clock with two states: idle and counting.
#[derive(Debug)]
pub struct CooldownTimer {
    state: CooldownState,
    generation: u64,
    period: Duration,
}

impl Default for CooldownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownTimer {
    /// A timer ticking once per second.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    /// A timer ticking once per `period`. Each tick still counts as one second.
    #[must_use]
    pub const fn with_period(period: Duration) -> Self {
        Self {
            state: CooldownState::idle(),
            generation: 0,
            period,
        }
    }

    /// Start counting down from `total_seconds`, replacing any countdown in
    /// progress.
    ///
    /// Spawns a task that sends exactly `total_seconds` ticks into `sink`, one
    /// per period, then ends. Ticks from earlier schedules become stale. A
    /// zero duration leaves the timer idle and schedules nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<E>(&mut self, total_seconds: u32, sink: &mpsc::UnboundedSender<E>) -> TickHandle
    where
        E: From<Tick> + Send + 'static,
    {
        self.generation += 1;
        self.state.start(total_seconds);

        if total_seconds == 0 {
            return TickHandle::inert();
        }

        let tick = Tick {
            generation: self.generation,
        };
        let sink = sink.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            for _ in 0..total_seconds {
                interval.tick().await;
                if sink.send(E::from(tick)).is_err() {
                    break;
                }
            }
        });

        TickHandle { task: Some(task) }
    }

    /// Apply a tick delivered from a schedule.
    pub const fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        if tick.generation != self.generation || self.state.is_idle() {
            return TickOutcome::Stale;
        }
        if self.state.tick() {
            TickOutcome::Expired
        } else {
            TickOutcome::Counting {
                remaining_seconds: self.state.remaining_seconds(),
            }
        }
    }

    /// Return to idle. Ticks from any earlier schedule become stale.
    pub const fn reset(&mut self) {
        self.generation += 1;
        self.state.reset();
    }

    /// Current countdown state.
    #[must_use]
    pub const fn state(&self) -> CooldownState {
        self.state
    }

    /// Returns `true` when no countdown is running.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.state.is_idle()
    }
}
