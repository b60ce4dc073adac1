//! Connectivity and identity signals.

use crate::error::{SyncError, SyncResult};
use folio_core::CallerIdentity;

/// What the reconciler knows about the device and the user.
///
/// Remote calls are attempted only when the device is online and a caller
/// identity is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    /// The device currently has connectivity.
    pub online: bool,
    /// The signed-in caller, if any.
    pub identity: Option<CallerIdentity>,
}

impl Presence {
    /// Offline and signed out.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Online as `identity`.
    pub fn signed_in(identity: CallerIdentity) -> Self {
        Self {
            online: true,
            identity: Some(identity),
        }
    }

    /// Returns true if a caller identity is present.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns the caller if remote calls may be attempted now.
    pub fn ready_caller(&self) -> Option<&CallerIdentity> {
        self.identity.as_ref().filter(|_| self.online)
    }

    /// Returns the caller, or [`SyncError::Unavailable`].
    pub fn require_ready(&self) -> SyncResult<CallerIdentity> {
        self.ready_caller()
            .cloned()
            .ok_or(SyncError::Unavailable {
                online: self.online,
                authenticated: self.is_authenticated(),
            })
    }
}
