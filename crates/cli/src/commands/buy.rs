//! Make a single purchase attempt.

use bobs_corn_core::PurchaseOutcome;
use bobs_corn_storefront::config::StorefrontConfig;
use bobs_corn_storefront::db::{FileStore, IdentityStore};
use bobs_corn_storefront::error::AppError;
use bobs_corn_storefront::purchase::{HttpPurchaseClient, Purchaser};
use bobs_corn_storefront::services::Notice;
use bobs_corn_storefront::view::NoticeView;

use super::CommandError;

/// Attempt one purchase and print how it ended.
///
/// No cooldown is waited out and nothing is retried: a rate-limited attempt
/// prints the server's retry hint and fails.
///
/// # Errors
///
/// Returns `CommandError::App` if the identity or HTTP client cannot be set
/// up, and `CommandError::NotPurchased` for any outcome other than success.
#[allow(clippy::print_stdout)]
pub async fn run(config: &StorefrontConfig, json: bool) -> Result<(), CommandError> {
    let client = HttpPurchaseClient::new(&config.api).map_err(AppError::from)?;
    let identity = IdentityStore::new(FileStore::new(&config.state_path))
        .get_or_create()
        .map_err(AppError::from)?;

    tracing::info!(url = %client.buy_url(), client_id = %identity.short(), "Attempting purchase");
    let outcome = client.attempt(&identity).await;

    if json {
        let rendered = serde_json::to_string(&outcome)
            .unwrap_or_else(|_| format!(r#"{{"kind":"{}"}}"#, outcome.label()));
        println!("{rendered}");
    } else {
        println!("{}", NoticeView(&Notice::from(outcome)));
    }

    match outcome {
        PurchaseOutcome::Success { .. } => Ok(()),
        other => Err(CommandError::NotPurchased(other.label())),
    }
}
