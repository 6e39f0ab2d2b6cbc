//! Purchase API client.
//!
//! # Contract
//!
//! One endpoint, `POST <api_base>/buy`, carrying the client identity in the
//! `x-client-id` header and an empty JSON body:
//!
//! | Status | Body | Outcome |
//! |--------|------|---------|
//! | 200 | `{"ok": true, "boughtAt": <epoch ms>}` | `Success` |
//! | 429 | `{"ok": false, "retryAfterSeconds": <int>}` (optional), `Retry-After` header (optional) | `RateLimited` |
//! | other / unparsable | - | `MalformedResponse` |
//! | no response | - | `NetworkFailure` |
//!
//! The client never retries. Retrying is the user's decision, gated by the
//! cooldown in [`crate::services::cooldown`].
//!
//! # Example
//!
//! ```rust,ignore
//! use bobs_corn_storefront::purchase::{HttpPurchaseClient, Purchaser};
//!
//! let client = HttpPurchaseClient::new(&config.api)?;
//! match client.attempt(&identity).await {
//!     PurchaseOutcome::Success { bought_at } => println!("bought at {bought_at}"),
//!     other => println!("{other:?}"),
//! }
//! ```

mod client;
pub mod response;

pub use client::{CLIENT_ID_HEADER, HttpPurchaseClient};

use std::future::Future;
use std::sync::Arc;

use bobs_corn_core::{ClientIdentity, PurchaseOutcome};
use thiserror::Error;

/// Errors that can occur while building a purchase client.
///
/// Attempt failures are not errors: they are classified into a
/// [`PurchaseOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Something that can attempt a purchase on behalf of a client identity.
pub trait Purchaser: Send + Sync + 'static {
    /// Send one purchase request and classify how it ended.
    fn attempt(
        &self,
        identity: &ClientIdentity,
    ) -> impl Future<Output = PurchaseOutcome> + Send;
}

impl<P: Purchaser> Purchaser for Arc<P> {
    fn attempt(
        &self,
        identity: &ClientIdentity,
    ) -> impl Future<Output = PurchaseOutcome> + Send {
        (**self).attempt(identity)
    }
}
