//! Purchase attempt outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single purchase attempt, as classified by the client.
///
/// Produced fresh for every attempt and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// The server accepted the purchase.
    Success {
        /// When the server recorded the purchase.
        bought_at: DateTime<Utc>,
    },
    /// The server rejected the purchase because the client is rate limited.
    RateLimited {
        /// How long the client should wait before trying again.
        retry_after_seconds: u32,
    },
    /// No response was received.
    NetworkFailure,
    /// A response was received but did not match the expected contract.
    MalformedResponse,
}

impl PurchaseOutcome {
    /// Returns `true` for a successful purchase.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the server-declared cooldown, if this is a rate-limit rejection.
    #[must_use]
    pub const fn retry_after_seconds(&self) -> Option<u32> {
        match self {
            Self::RateLimited {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    /// Short machine-friendly label, used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::RateLimited { .. } => "rate_limited",
            Self::NetworkFailure => "network_failure",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

/// The most recent terminal outcome, kept so the view can acknowledge it.
///
/// This is not a history: the controller replaces it wholesale on every new
/// terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLog {
    /// Sequence number of the attempt within the session, starting at 1.
    pub attempt: u64,
    /// How the attempt ended.
    pub outcome: PurchaseOutcome,
}

impl AttemptLog {
    /// Create a log entry for a finished attempt.
    #[must_use]
    pub const fn new(attempt: u64, outcome: PurchaseOutcome) -> Self {
        Self { attempt, outcome }
    }

    /// Time of the last successful purchase, if the last attempt succeeded.
    #[must_use]
    pub const fn bought_at(&self) -> Option<DateTime<Utc>> {
        match self.outcome {
            PurchaseOutcome::Success { bought_at } => Some(bought_at),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_seconds() {
        let limited = PurchaseOutcome::RateLimited {
            retry_after_seconds: 42,
        };
        assert_eq!(limited.retry_after_seconds(), Some(42));
        assert_eq!(PurchaseOutcome::NetworkFailure.retry_after_seconds(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PurchaseOutcome::NetworkFailure.label(), "network_failure");
        assert_eq!(
            PurchaseOutcome::MalformedResponse.label(),
            "malformed_response"
        );
    }

    #[test]
    fn test_attempt_log_bought_at() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let log = AttemptLog::new(1, PurchaseOutcome::Success { bought_at: at });
        assert_eq!(log.bought_at(), Some(at));

        let log = AttemptLog::new(2, PurchaseOutcome::NetworkFailure);
        assert_eq!(log.bought_at(), None);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(PurchaseOutcome::RateLimited {
            retry_after_seconds: 5,
        })
        .unwrap();
        assert_eq!(json["kind"], "rate_limited");
        assert_eq!(json["retry_after_seconds"], 5);
    }
}
