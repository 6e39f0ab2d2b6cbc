//! Purchase response wire format and outcome classification.

use bobs_corn_core::PurchaseOutcome;
use chrono::DateTime;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Deserialize;

/// Body returned by the purchase endpoint.
///
/// Every field is optional on the wire; which ones are required depends on
/// the status code.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// `true` when the purchase went through.
    #[serde(default)]
    pub ok: Option<bool>,
    /// Purchase time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub bought_at: Option<i64>,
    /// Body-level retry hint in seconds.
    #[serde(default)]
    pub retry_after_seconds: Option<u32>,
}

/// Parse a `Retry-After` header holding a non-negative integer of seconds.
///
/// The HTTP-date form is not produced by the purchase server and yields
/// `None`, as does anything else unparsable.
#[must_use]
pub fn parse_retry_after(value: &HeaderValue) -> Option<u32> {
    value.to_str().ok()?.trim().parse().ok()
}

/// Classify a received response into a [`PurchaseOutcome`].
///
/// `retry_after` is the transport-level hint and wins over the body-level
/// hint; `default_retry_after_secs` applies only when both are missing.
#[must_use]
pub fn classify(
    status: StatusCode,
    retry_after: Option<u32>,
    body: &str,
    default_retry_after_secs: u32,
) -> PurchaseOutcome {
    let Some(response) = parse_body(body) else {
        return PurchaseOutcome::MalformedResponse;
    };

    match status {
        StatusCode::OK => match (response.ok, response.bought_at) {
            (Some(true), Some(millis)) => DateTime::from_timestamp_millis(millis)
                .map_or(PurchaseOutcome::MalformedResponse, |bought_at| {
                    PurchaseOutcome::Success { bought_at }
                }),
            _ => PurchaseOutcome::MalformedResponse,
        },
        StatusCode::TOO_MANY_REQUESTS => PurchaseOutcome::RateLimited {
            retry_after_seconds: retry_after
                .or(response.retry_after_seconds)
                .unwrap_or(default_retry_after_secs),
        },
        _ => PurchaseOutcome::MalformedResponse,
    }
}

/// Parse a body that must be a JSON object. Arrays and scalars are rejected
/// even when serde could map them onto the struct fields.
fn parse_body(body: &str) -> Option<PurchaseResponse> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}
