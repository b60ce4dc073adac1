//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot be used with a storage medium.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The write would exceed the medium's quota.
    #[error("storage quota exceeded: needed {needed} bytes, quota {quota} bytes")]
    QuotaExceeded {
        /// Total bytes the medium would hold after the write.
        needed: u64,
        /// The configured quota.
        quota: u64,
    },

    /// The medium cannot be accessed at all (read-only, private mode, revoked).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be interpreted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Returns true if this error means the medium is out of space or inaccessible.
    ///
    /// Capacity faults degrade to the in-memory fallback rather than failing
    /// the user's operation outright.
    pub fn is_capacity_fault(&self) -> bool {
        match self {
            StorageError::QuotaExceeded { .. } | StorageError::Unavailable(_) => true,
            StorageError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::PermissionDenied
                    | io::ErrorKind::ReadOnlyFilesystem
                    | io::ErrorKind::StorageFull
                    | io::ErrorKind::QuotaExceeded
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_faults() {
        assert!(StorageError::QuotaExceeded { needed: 10, quota: 5 }.is_capacity_fault());
        assert!(StorageError::Unavailable("private mode".into()).is_capacity_fault());
        assert!(StorageError::Io(io::Error::from(io::ErrorKind::PermissionDenied))
            .is_capacity_fault());
        assert!(!StorageError::Corrupted("bad json".into()).is_capacity_fault());
        assert!(!StorageError::InvalidKey("a/b".into()).is_capacity_fault());
    }

    #[test]
    fn display_mentions_quota() {
        let err = StorageError::QuotaExceeded { needed: 2048, quota: 1024 };
        let text = err.to_string();
        assert!(text.contains("quota"));
        assert!(text.contains("2048"));
    }
}
