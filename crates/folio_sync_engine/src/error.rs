//! Error types for the sync engine.

use folio_core::{classify, CoreError};
use thiserror::Error;

/// Result type for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for remote gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by a [`crate::RemoteGateway`].
///
/// Display strings use the phrases the error classifier recognizes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The caller is not allowed to perform the call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A resume with this id already exists remotely.
    #[error("resume already exists: {0}")]
    AlreadyExists(String),

    /// No remote resume with this id exists for the caller.
    #[error("resume not found: {0}")]
    NotFound(String),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the call can be retried.
        retryable: bool,
    },

    /// The remote store rejected the call.
    #[error("remote error: {0}")]
    Remote(String),
}

impl GatewayError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { retryable, .. } => *retryable,
            GatewayError::Remote(_) => true,
            _ => false,
        }
    }
}

/// Errors returned by the [`crate::Reconciler`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local store failed; the operation did not happen.
    #[error("local error: {0}")]
    Local(#[from] CoreError),

    /// A drain was requested while offline or signed out.
    #[error("Cannot sync: {}", unavailable_reason(*online, *authenticated))]
    Unavailable {
        /// Whether the device was online.
        online: bool,
        /// Whether a caller identity was present.
        authenticated: bool,
    },

    /// Some queued operations failed; they stay queued.
    #[error("Sync partially completed: {succeeded} succeeded, {failed} failed")]
    PartialSync {
        /// Entries replayed or superseded.
        succeeded: usize,
        /// Entries left in the queue.
        failed: usize,
    },

    /// Every queued operation failed; they all stay queued.
    #[error("Sync failed: all {failed} queued operations failed")]
    DrainFailed {
        /// Entries left in the queue.
        failed: usize,
    },

    /// Another drain is in flight.
    #[error("a sync is already in progress")]
    AlreadyDraining,
}

impl SyncError {
    /// Returns the message to show the user.
    pub fn user_message(&self) -> String {
        classify(self).user_message
    }

    /// Returns true for outcomes where queued work is kept for a later drain.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Unavailable { .. }
                | SyncError::PartialSync { .. }
                | SyncError::DrainFailed { .. }
                | SyncError::AlreadyDraining
        )
    }
}

fn unavailable_reason(online: bool, authenticated: bool) -> &'static str {
    match (online, authenticated) {
        (false, _) => "device is offline",
        (true, false) => "not signed in",
        (true, true) => "remote store unavailable",
    }
}
