//! In-memory storage medium.

use crate::error::StorageResult;
use crate::medium::{validate_key, StorageMedium};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key/value medium.
///
/// This medium keeps every value in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Sessions where nothing should outlive the process
///
/// # Thread Safety
///
/// This medium is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use folio_storage::{InMemoryMedium, StorageMedium};
///
/// let medium = InMemoryMedium::new();
/// medium.set("greeting", b"hello").unwrap();
/// assert_eq!(medium.get("greeting").unwrap().as_deref(), Some(&b"hello"[..]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMedium {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryMedium {
    /// Creates a new empty in-memory medium.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory medium with pre-existing values.
    ///
    /// Useful for testing migration and corruption scenarios.
    #[must_use]
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Returns the keys currently stored, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the total number of value bytes held.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.entries.read().values().map(|v| v.len() as u64).sum()
    }

    /// Removes every value.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl StorageMedium for InMemoryMedium {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().remove(key);
        Ok(())
    }
}
