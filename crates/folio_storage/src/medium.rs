//! Storage medium trait definition.

use crate::error::StorageResult;

/// A synchronous key/value medium for Folio.
///
/// Media are **opaque byte stores** addressed by string keys. They do not
/// know about resumes, queues, or schema versions; `folio_core` owns all
/// interpretation of the bytes.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last written with `set` for that key
/// - `set` replaces the whole value; there are no partial writes visible to `get`
/// - `remove` of a missing key succeeds
/// - Media must be `Send + Sync` so one instance can back several stores
///
/// # Implementors
///
/// - [`super::InMemoryMedium`] - For testing and as a medium of last resort
/// - [`super::FileMedium`] - For persistent storage in a directory
pub trait StorageMedium: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the medium cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is invalid
    /// - The medium is read-only or otherwise inaccessible
    /// - The write would exceed the medium's quota
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<M: StorageMedium + ?Sized> StorageMedium for std::sync::Arc<M> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

impl<M: StorageMedium + ?Sized> StorageMedium for Box<M> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// Checks that a key is usable by every medium.
///
/// Keys are restricted to `[A-Za-z0-9_.-]`, must not be empty and must not
/// start with a dot, so that a key can always be used as a file name.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));

    if valid {
        Ok(())
    } else {
        Err(crate::error::StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_namespaced_keys() {
        assert!(validate_key("resumeBuilder_resumes").is_ok());
        assert!(validate_key("__storage_test__").is_ok());
        assert!(validate_key("v1.0-queue").is_ok());
    }

    #[test]
    fn rejects_path_like_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
    }
}
