//! Print the client identity.

use bobs_corn_storefront::config::StorefrontConfig;
use bobs_corn_storefront::db::{FileStore, IdentityStore};
use bobs_corn_storefront::error::AppError;

use super::CommandError;

/// Print the identity, creating and persisting it on first use.
///
/// # Errors
///
/// Returns an error if the state file cannot be read or written.
#[allow(clippy::print_stdout)]
pub fn show(config: &StorefrontConfig) -> Result<(), CommandError> {
    let mut identities = IdentityStore::new(FileStore::new(&config.state_path));
    let identity = identities.get_or_create().map_err(AppError::from)?;

    println!("{identity}");
    tracing::debug!(state = %config.state_path.display(), "Identity loaded");
    Ok(())
}
