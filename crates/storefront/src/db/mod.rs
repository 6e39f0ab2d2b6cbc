//! Local state storage for the purchase client.
//!
//! # Layout
//!
//! Everything the client persists lives in one JSON object file
//! (`state.json` under the platform data directory unless `CORN_STATE_PATH`
//! says otherwise):
//!
//! ```json
//! { "bobs-corn-client-id": "3f2b9c1e-4d5a-4b6c-8d7e-0123456789ab" }
//! ```
//!
//! # Repositories
//!
//! - [`identity::IdentityStore`] - get-or-create the durable client identity

pub mod identity;

pub use identity::{IdentityError, IdentityStore};

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bobs_corn_core::{KeyValueStore, StoreError};

/// [`KeyValueStore`] backed by a JSON object file.
///
/// Reads go to disk on every call so an external edit is picked up; writes
/// land in a sibling temporary file that is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "reading {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let unavailable =
            |e: std::io::Error| StoreError::Unavailable(format!("writing {}: {e}", self.path.display()));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(unavailable)?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(unavailable)?;
        fs::rename(&tmp, &self.path).map_err(unavailable)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }
}
