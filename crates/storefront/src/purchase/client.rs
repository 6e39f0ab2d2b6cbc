//! HTTP implementation of [`Purchaser`].

use std::sync::Arc;

use bobs_corn_core::{ClientIdentity, PurchaseOutcome};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;

use super::response::{classify, parse_retry_after};
use super::{ClientError, Purchaser};

/// Header carrying the client identity.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Purchase API client over HTTP.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpPurchaseClient {
    inner: Arc<HttpPurchaseClientInner>,
}

struct HttpPurchaseClientInner {
    client: reqwest::Client,
    buy_url: Url,
    default_retry_after_secs: u32,
}

impl HttpPurchaseClient {
    /// Create a new purchase client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpPurchaseClientInner {
                client,
                buy_url: config.buy_url(),
                default_retry_after_secs: config.default_retry_after_secs,
            }),
        })
    }

    /// The endpoint purchases are sent to.
    #[must_use]
    pub fn buy_url(&self) -> &Url {
        &self.inner.buy_url
    }
}

impl Purchaser for HttpPurchaseClient {
    #[instrument(skip(self, identity), fields(client_id = %identity.short()))]
    async fn attempt(&self, identity: &ClientIdentity) -> PurchaseOutcome {
        let response = match self
            .inner
            .client
            .post(self.inner.buy_url.clone())
            .header(CLIENT_ID_HEADER, identity.as_str())
            .body("{}")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Purchase request failed before a response arrived");
                return PurchaseOutcome::NetworkFailure;
            }
        };

        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).and_then(parse_retry_after);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, %status, "Purchase response body could not be read");
                return PurchaseOutcome::NetworkFailure;
            }
        };

        let outcome = classify(status, retry_after, &body, self.inner.default_retry_after_secs);

        if outcome == PurchaseOutcome::MalformedResponse {
            tracing::warn!(
                %status,
                body = %truncate(&body, 256),
                "Unexpected purchase response"
            );
        } else {
            tracing::debug!(%status, outcome = outcome.label(), "Purchase response classified");
        }

        outcome
    }
}

/// Cut `s` to at most `max` bytes on a char boundary, for logging.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.get(..end).unwrap_or(s)
}
