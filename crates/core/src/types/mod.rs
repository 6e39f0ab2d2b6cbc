//! Core types for Bob's Corn.
//!
//! This module provides type-safe wrappers for the purchase flow's domain concepts.

pub mod cooldown;
pub mod identity;
pub mod outcome;

pub use cooldown::CooldownState;
pub use identity::{ClientIdentity, IdentityParseError};
pub use outcome::{AttemptLog, PurchaseOutcome};
