//! Durable client identity.

use bobs_corn_core::{ClientIdentity, KeyValueStore, StoreError};
use thiserror::Error;

/// Key under which the identity is persisted.
pub const CLIENT_ID_KEY: &str = "bobs-corn-client-id";

/// Errors from [`IdentityStore`].
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The persistence medium could not be used. The purchase flow cannot
    /// proceed: a throwaway identity would escape per-client rate limiting.
    #[error("client identity unavailable: {0}")]
    IdentityUnavailable(#[from] StoreError),
}

/// Get-or-create repository for the [`ClientIdentity`].
///
/// The identity is written at most once per device profile; every later call,
/// including after a restart, returns the stored value.
#[derive(Debug)]
pub struct IdentityStore<S> {
    store: S,
}

impl<S: KeyValueStore> IdentityStore<S> {
    /// Wrap a key-value store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Return the stored identity, generating and persisting one if absent.
    ///
    /// Blank or unparsable stored values are treated as absent and replaced.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::IdentityUnavailable` if the store cannot be
    /// read, or if a freshly generated identity cannot be persisted.
    pub fn get_or_create(&mut self) -> Result<ClientIdentity, IdentityError> {
        if let Some(raw) = self.store.get(CLIENT_ID_KEY)? {
            match ClientIdentity::parse(&raw) {
                Ok(identity) => return Ok(identity),
                Err(e) => tracing::warn!(error = %e, "Discarding invalid stored client identity"),
            }
        }

        let identity = ClientIdentity::generate();
        self.store.set(CLIENT_ID_KEY, identity.as_str())?;
        tracing::info!(client_id = %identity.short(), "Created new client identity");
        Ok(identity)
    }

    /// Give back the underlying store.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::FileStore;
    use bobs_corn_core::MemoryStore;

    /// A store whose medium is gone.
    struct BrokenStore {
        fail_reads: bool,
    }

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_reads {
                Err(StoreError::Unavailable("medium unplugged".to_string()))
            } else {
                Ok(None)
            }
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only medium".to_string()))
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut identities = IdentityStore::new(MemoryStore::new());
        let first = identities.get_or_create().unwrap();
        let second = identities.get_or_create().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_survives_restart_with_memory_store() {
        let mut identities = IdentityStore::new(MemoryStore::new());
        let first = identities.get_or_create().unwrap();

        // Simulated restart: new repository over the same persisted data
        let mut identities = IdentityStore::new(identities.into_inner());
        assert_eq!(identities.get_or_create().unwrap(), first);
    }

    #[test]
    fn test_survives_restart_with_file_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");

        let first = IdentityStore::new(FileStore::new(&path))
            .get_or_create()
            .unwrap();
        let second = IdentityStore::new(FileStore::new(&path))
            .get_or_create()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_persists_under_fixed_key() {
        let mut identities = IdentityStore::new(MemoryStore::new());
        let identity = identities.get_or_create().unwrap();
        let store = identities.into_inner();
        assert_eq!(
            store.get(CLIENT_ID_KEY).unwrap().as_deref(),
            Some(identity.as_str())
        );
    }

    #[test]
    fn test_existing_identity_is_returned_verbatim() {
        let mut store = MemoryStore::new();
        store.set(CLIENT_ID_KEY, "legacy-client-42").unwrap();

        let mut identities = IdentityStore::new(store);
        assert_eq!(
            identities.get_or_create().unwrap().as_str(),
            "legacy-client-42"
        );
    }

    #[test]
    fn test_blank_identity_is_replaced() {
        let mut store = MemoryStore::new();
        store.set(CLIENT_ID_KEY, "   ").unwrap();

        let mut identities = IdentityStore::new(store);
        let identity = identities.get_or_create().unwrap();
        assert!(!identity.as_str().is_empty());
        assert_eq!(
            identities.into_inner().get(CLIENT_ID_KEY).unwrap().as_deref(),
            Some(identity.as_str())
        );
    }

    #[test]
    fn test_unreadable_store_is_unavailable() {
        let mut identities = IdentityStore::new(BrokenStore { fail_reads: true });
        assert!(matches!(
            identities.get_or_create(),
            Err(IdentityError::IdentityUnavailable(_))
        ));
    }

    #[test]
    fn test_unwritable_store_does_not_fabricate_identity() {
        let mut identities = IdentityStore::new(BrokenStore { fail_reads: false });
        assert!(matches!(
            identities.get_or_create(),
            Err(IdentityError::IdentityUnavailable(_))
        ));
    }
}
