//! Purchase attempt state machine.
//!
//! The controller is a plain `&mut self` state machine. Everything it reacts
//! to arrives as a [`ControllerEvent`]: user actions from the input source,
//! and attempt completions and countdown ticks through the event channel
//! handed to [`PurchaseController::new`]. The caller owns the receiving end
//! and feeds each event to [`PurchaseController::handle`], so no two events
//! are ever processed at the same time.
//!
//! ```text
//!           buy                    RateLimited(n > 0)
//!  Ready ---------> InFlight ----------------------------> Cooldown
//!    ^                 |                                      |
//!    |  Success /      |                                      |
//!    |  NetworkFailure |                                      |
//!    |  Malformed /    |                                      |
//!    |  RateLimited(0) |                                      |
//!    +-----------------+             countdown reaches 0      |
//!    +--------------------------------------------------------+
//! ```

use std::sync::Arc;

use bobs_corn_core::{
    AttemptLog, ClientIdentity, CooldownState, KeyValueStore, PurchaseOutcome,
};
use tokio::sync::mpsc;

use crate::db::{IdentityError, IdentityStore};
use crate::purchase::Purchaser;

use super::cooldown::{CooldownTimer, Tick, TickHandle, TickOutcome};
use super::notice::Notice;

/// Where the controller is in the attempt lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting purchase actions.
    Ready,
    /// A purchase request is outstanding.
    InFlight,
    /// Waiting out a server-declared cooldown.
    Cooldown,
}

/// Input to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The user asked to buy.
    BuyPressed,
    /// A purchase attempt finished.
    Completed {
        /// Sequence number of the attempt that finished.
        attempt: u64,
        /// How it ended.
        outcome: PurchaseOutcome,
    },
    /// One countdown second elapsed.
    Tick(Tick),
}

impl From<Tick> for ControllerEvent {
    fn from(tick: Tick) -> Self {
        Self::Tick(tick)
    }
}

/// Immutable view of the controller, rebuilt on every call to
/// [`PurchaseController::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// Where the controller is in the buy cycle.
    pub phase: Phase,
    /// Countdown state; idle unless `phase` is `Cooldown`.
    pub cooldown: CooldownState,
    /// Most recent finished attempt, if any.
    pub last_attempt: Option<AttemptLog>,
    /// Identity sent with every purchase.
    pub identity: ClientIdentity,
}

impl ControllerSnapshot {
    /// Returns `true` if a buy action would start a request.
    #[must_use]
    pub fn can_purchase(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Cooldown progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.cooldown.progress()
    }
}

type SuccessObserver = Box<dyn FnMut(&AttemptLog) + Send>;

/// Orchestrates identity, purchase client and cooldown timer into the
/// visible attempt lifecycle.
pub struct PurchaseController<P> {
    purchaser: Arc<P>,
    identity: ClientIdentity,
    events: mpsc::UnboundedSender<ControllerEvent>,
    phase: Phase,
    attempt: u64,
    timer: CooldownTimer,
    schedule: Option<TickHandle>,
    last_attempt: Option<AttemptLog>,
    success_observers: Vec<SuccessObserver>,
    torn_down: bool,
}

impl<P> std::fmt::Debug for PurchaseController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseController")
            .field("identity", &self.identity)
            .field("phase", &self.phase)
            .field("attempt", &self.attempt)
            .field("timer", &self.timer)
            .field("last_attempt", &self.last_attempt)
            .field("success_observers", &self.success_observers.len())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl<P: Purchaser> PurchaseController<P> {
    /// Create a controller in `Ready` for an already resolved identity.
    ///
    /// Completions and ticks are sent to `events`; the caller feeds them
    /// back through [`handle`](Self::handle).
    #[must_use]
    pub fn new(
        purchaser: P,
        identity: ClientIdentity,
        events: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            purchaser: Arc::new(purchaser),
            identity,
            events,
            phase: Phase::Ready,
            attempt: 0,
            timer: CooldownTimer::new(),
            schedule: None,
            last_attempt: None,
            success_observers: Vec::new(),
            torn_down: false,
        }
    }

    /// Create a controller, resolving the session identity from `identities`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::IdentityUnavailable` if no durable identity
    /// can be obtained. The purchase flow cannot proceed without one.
    pub fn with_identity_store<S: KeyValueStore>(
        purchaser: P,
        identities: &mut IdentityStore<S>,
        events: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Result<Self, IdentityError> {
        let identity = identities.get_or_create()?;
        Ok(Self::new(purchaser, identity, events))
    }

    /// Replace the cooldown timer, e.g. to change the tick period.
    #[must_use]
    pub fn with_timer(mut self, timer: CooldownTimer) -> Self {
        self.timer = timer;
        self
    }

    /// Register a callback run once for every successful attempt.
    pub fn on_success<F>(&mut self, observer: F)
    where
        F: FnMut(&AttemptLog) + Send + 'static,
    {
        self.success_observers.push(Box::new(observer));
    }

    /// Process one event.
    ///
    /// Returns the notice to show the user, if any. Every terminal attempt
    /// outcome yields exactly one notice. After [`teardown`](Self::teardown)
    /// all events are ignored.
    pub fn handle(&mut self, event: ControllerEvent) -> Option<Notice> {
        if self.torn_down {
            tracing::debug!(?event, "Controller torn down, discarding event");
            return None;
        }

        match event {
            ControllerEvent::BuyPressed => self.buy(),
            ControllerEvent::Completed { attempt, outcome } => self.complete(attempt, outcome),
            ControllerEvent::Tick(tick) => {
                self.tick(tick);
                None
            }
        }
    }

    fn buy(&mut self) -> Option<Notice> {
        match self.phase {
            Phase::Ready => {
                self.start_attempt();
                None
            }
            Phase::InFlight => {
                tracing::debug!(attempt = self.attempt, "Purchase already in flight");
                Some(Notice::Busy)
            }
            Phase::Cooldown => {
                let remaining_seconds = self.timer.state().remaining_seconds();
                tracing::debug!(remaining_seconds, "Purchase rejected during cooldown");
                Some(Notice::CoolingDown { remaining_seconds })
            }
        }
    }

    fn start_attempt(&mut self) {
        self.attempt += 1;
        self.phase = Phase::InFlight;

        let attempt = self.attempt;
        let purchaser = Arc::clone(&self.purchaser);
        let identity = self.identity.clone();
        let events = self.events.clone();

        tracing::info!(attempt, client_id = %identity.short(), "Starting purchase attempt");

        tokio::spawn(async move {
            let outcome = purchaser.attempt(&identity).await;
            // A closed channel means the session ended; the result is dropped
            let _ = events.send(ControllerEvent::Completed { attempt, outcome });
        });
    }

    fn complete(&mut self, attempt: u64, outcome: PurchaseOutcome) -> Option<Notice> {
        if self.phase != Phase::InFlight || attempt != self.attempt {
            tracing::debug!(
                attempt,
                current = self.attempt,
                "Discarding stale purchase completion"
            );
            return None;
        }

        let log = AttemptLog::new(attempt, outcome);
        self.last_attempt = Some(log);

        match outcome {
            PurchaseOutcome::Success { bought_at } => {
                self.phase = Phase::Ready;
                tracing::info!(attempt, %bought_at, "Purchase succeeded");
                for observer in &mut self.success_observers {
                    observer(&log);
                }
            }
            PurchaseOutcome::RateLimited {
                retry_after_seconds,
            } => {
                tracing::info!(attempt, retry_after_seconds, "Purchase rate limited");
                self.start_cooldown(retry_after_seconds);
            }
            PurchaseOutcome::NetworkFailure => {
                self.phase = Phase::Ready;
                tracing::warn!(attempt, "Purchase failed: server unreachable");
            }
            PurchaseOutcome::MalformedResponse => {
                self.phase = Phase::Ready;
                tracing::warn!(attempt, "Purchase failed: protocol mismatch with server");
            }
        }

        Some(Notice::from(outcome))
    }

    fn start_cooldown(&mut self, seconds: u32) {
        // Replacing the handle cancels any schedule still running
        self.schedule = Some(self.timer.start(seconds, &self.events));
        if self.timer.is_idle() {
            self.schedule = None;
            self.phase = Phase::Ready;
        } else {
            self.phase = Phase::Cooldown;
        }
    }

    fn tick(&mut self, tick: Tick) {
        match self.timer.on_tick(tick) {
            TickOutcome::Stale => tracing::debug!("Ignoring stale cooldown tick"),
            TickOutcome::Counting { remaining_seconds } => {
                tracing::debug!(remaining_seconds, "Cooldown tick");
            }
            TickOutcome::Expired => {
                self.schedule = None;
                if self.phase == Phase::Cooldown {
                    self.phase = Phase::Ready;
                    tracing::info!("Cooldown over, purchases re-enabled");
                }
            }
        }
    }

    /// Stop the controller: cancel the countdown and ignore every later
    /// event, including the result of a request still in flight.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }
        self.timer.reset();
        tracing::info!(attempts = self.attempt, "Purchase controller torn down");
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The identity every attempt of this session is made under.
    #[must_use]
    pub const fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Returns `true` once [`Self::teardown`] has run.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Immutable view for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            cooldown: self.timer.state(),
            last_attempt: self.last_attempt,
            identity: self.identity.clone(),
        }
    }
}
