//! User-facing notifications.

use std::fmt;

use bobs_corn_core::PurchaseOutcome;
use chrono::{DateTime, Utc};

use crate::db::IdentityError;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something the user asked for happened.
    Success,
    /// Nothing went wrong, but nothing happened either.
    Info,
    /// The attempt failed or cannot be made.
    Error,
}

/// Transient notification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A purchase went through.
    Purchased { bought_at: DateTime<Utc> },
    /// The server refused the purchase for now.
    RateLimited { retry_after_seconds: u32 },
    /// The server could not be reached.
    NetworkFailure,
    /// The server answered with something unexpected.
    MalformedResponse,
    /// A purchase is already on its way.
    Busy,
    /// The cooldown is still running.
    CoolingDown { remaining_seconds: u32 },
    /// No durable identity, so no purchase can be made.
    IdentityUnavailable,
}

impl Notice {
    /// Presentation class of this notice.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Purchased { .. } => Severity::Success,
            Self::Busy | Self::CoolingDown { .. } => Severity::Info,
            Self::RateLimited { .. }
            | Self::NetworkFailure
            | Self::MalformedResponse
            | Self::IdentityUnavailable => Severity::Error,
        }
    }

    /// Returns `true` if this notice reports how an attempt ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Purchased { .. }
                | Self::RateLimited { .. }
                | Self::NetworkFailure
                | Self::MalformedResponse
        )
    }
}

impl From<PurchaseOutcome> for Notice {
    fn from(outcome: PurchaseOutcome) -> Self {
        match outcome {
            PurchaseOutcome::Success { bought_at } => Self::Purchased { bought_at },
            PurchaseOutcome::RateLimited {
                retry_after_seconds,
            } => Self::RateLimited {
                retry_after_seconds,
            },
            PurchaseOutcome::NetworkFailure => Self::NetworkFailure,
            PurchaseOutcome::MalformedResponse => Self::MalformedResponse,
        }
    }
}

impl From<&IdentityError> for Notice {
    fn from(_: &IdentityError) -> Self {
        Self::IdentityUnavailable
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchased { bought_at } => write!(
                f,
                "Purchase complete at {}. Enjoy your corn!",
                bought_at.format("%H:%M:%S UTC")
            ),
            Self::RateLimited {
                retry_after_seconds,
            } => write!(
                f,
                "Rate limit active. You can buy again in {retry_after_seconds}s."
            ),
            Self::NetworkFailure => f.write_str("Could not reach the server. Please try again."),
            Self::MalformedResponse => {
                f.write_str("The server sent an unexpected response. Please try again.")
            }
            Self::Busy => f.write_str("A purchase is already in progress."),
            Self::CoolingDown { remaining_seconds } => {
                write!(f, "Please wait {remaining_seconds}s before buying again.")
            }
            Self::IdentityUnavailable => f.write_str(
                "Cannot proceed: this device's client identity could not be loaded or saved.",
            ),
        }
    }
}
