//! Purchase flow services.
//!
//! # Services
//!
//! - `cooldown` - Countdown clock gating re-attempts after a rate-limit rejection
//! - `controller` - Purchase attempt state machine (`Ready` / `InFlight` / `Cooldown`)
//! - `notice` - User-facing notifications emitted by the controller

pub mod controller;
pub mod cooldown;
pub mod notice;

pub use controller::{ControllerEvent, ControllerSnapshot, Phase, PurchaseController};
pub use cooldown::{CooldownTimer, Tick, TickHandle, TickOutcome};
pub use notice::{Notice, Severity};
