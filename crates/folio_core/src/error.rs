//! Error types for Folio core.

use crate::model::ResumeId;
use folio_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad category of a core error, used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The durable medium is full, inaccessible, or failed a write.
    Storage,
    /// The request referenced something that does not exist.
    NotFound,
    /// The caller supplied invalid input.
    Input,
    /// A stored or received value could not be encoded or decoded.
    Codec,
}

/// Errors that can occur in Folio core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage medium error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The durable write failed; the change lives only in temporary memory.
    #[error("failed to save to local storage, using temporary in-memory storage: {source}")]
    NotDurable {
        /// The underlying medium failure.
        source: StorageError,
    },

    /// No resume with this id exists locally.
    #[error("resume not found: {0}")]
    NotFound(ResumeId),

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::Storage(_) | CoreError::NotDurable { .. } => ErrorCategory::Storage,
            CoreError::NotFound(_) => ErrorCategory::NotFound,
            CoreError::InvalidInput(_) => ErrorCategory::Input,
            CoreError::Codec(_) => ErrorCategory::Codec,
        }
    }

    /// Returns true if the change was kept in memory even though this error occurred.
    pub fn is_transient_save(&self) -> bool {
        matches!(self, CoreError::NotDurable { .. })
    }
}
