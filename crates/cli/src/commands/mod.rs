//! Command implementations.

pub mod buy;
pub mod identity;

use bobs_corn_storefront::error::AppError;
use thiserror::Error;

/// Why a command ended without success.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Setup failed before the command could do its work.
    #[error(transparent)]
    App(#[from] AppError),

    /// The purchase attempt ended without a purchase.
    #[error("Purchase not completed: {0}")]
    NotPurchased(&'static str),
}

impl CommandError {
    /// Log the failure. Setup errors are also captured to Sentry; a refused
    /// purchase is an expected result, not a fault.
    pub fn report(&self) {
        match self {
            Self::App(e) => e.report(),
            Self::NotPurchased(outcome) => tracing::info!(outcome, "Purchase not completed"),
        }
    }
}
