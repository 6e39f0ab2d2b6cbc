//! Unified error handling with Sentry integration.
//!
//! Attempt failures never reach this type: the controller turns them into
//! notices. `AppError` covers what stops a binary from running at all.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::IdentityError;
use crate::purchase::ClientError;

/// Application-level error type for the purchase client binaries.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No durable client identity.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The purchase client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Terminal input or output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Log the error and capture it to Sentry.
    pub fn report(&self) {
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Fatal error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobs_corn_core::StoreError;

    #[test]
    fn test_identity_error_converts() {
        let err: AppError =
            IdentityError::IdentityUnavailable(StoreError::Corrupt("bad json".to_string())).into();
        assert!(matches!(err, AppError::Identity(_)));
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: AppError =
            ConfigError::InvalidEnvVar("CORN_API_URL".to_string(), "not a url".to_string()).into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
