//! Drain state, statistics and status reporting.

use folio_core::{time_ago, StorageStatus};

/// The state of the drain machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    /// No drain has run yet.
    #[default]
    Idle,
    /// A drain is in flight.
    Draining,
    /// The last drain replayed every queued entry.
    Synced,
    /// The last drain left some entries queued.
    Partial,
    /// The last drain replayed nothing.
    Error,
}

impl DrainState {
    /// Returns true while a drain is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, DrainState::Draining)
    }

    /// Returns true if the last drain left work behind.
    pub fn needs_attention(&self) -> bool {
        matches!(self, DrainState::Partial | DrainState::Error)
    }
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries attempted.
    pub processed: usize,
    /// Entries replayed against the remote store.
    pub succeeded: usize,
    /// Entries that failed and stay queued.
    pub failed: usize,
    /// Entries dropped because the local resume no longer exists.
    pub superseded: usize,
    /// Queue index and message of every failed entry.
    pub errors: Vec<(usize, String)>,
}

impl DrainReport {
    /// Returns true if nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Entries removed from the queue by this pass.
    pub fn settled(&self) -> usize {
        self.succeeded + self.superseded
    }
}

/// Statistics about drains.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Drains that ran to the end of the queue.
    pub drains_completed: u64,
    /// Entries replayed successfully across all drains.
    pub operations_replayed: u64,
    /// Entry failures across all drains.
    pub operations_failed: u64,
    /// Report of the most recent drain.
    pub last_report: Option<DrainReport>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Snapshot behind the sync status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    /// The device is online.
    pub online: bool,
    /// A caller identity is present.
    pub authenticated: bool,
    /// Queued entries.
    pub pending: usize,
    /// Last completed drain, epoch milliseconds.
    pub last_sync: Option<i64>,
    /// Drain state.
    pub state: DrainState,
    /// Local storage availability.
    pub storage: StorageStatus,
}

impl SyncStatus {
    /// Describes the last sync relative to `now`, e.g. `"5m ago"`.
    pub fn format_last_sync(&self, now: i64) -> String {
        time_ago(self.last_sync, now)
    }

    /// Short label for the badge.
    pub fn label(&self) -> &'static str {
        if !self.online {
            "Offline"
        } else if self.state.is_active() {
            "Syncing"
        } else if self.pending > 0 {
            "Pending"
        } else {
            "Synced"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(online: bool, pending: usize, state: DrainState) -> SyncStatus {
        SyncStatus {
            online,
            authenticated: true,
            pending,
            last_sync: None,
            state,
            storage: StorageStatus {
                available: true,
                using_memory: false,
            },
        }
    }

    #[test]
    fn drain_state_checks() {
        assert!(DrainState::Draining.is_active());
        assert!(!DrainState::Synced.is_active());
        assert!(DrainState::Partial.needs_attention());
        assert!(DrainState::Error.needs_attention());
        assert!(!DrainState::Idle.needs_attention());
    }

    #[test]
    fn badge_labels() {
        assert_eq!(status(false, 3, DrainState::Idle).label(), "Offline");
        assert_eq!(status(true, 3, DrainState::Draining).label(), "Syncing");
        assert_eq!(status(true, 3, DrainState::Partial).label(), "Pending");
        assert_eq!(status(true, 0, DrainState::Synced).label(), "Synced");
    }

    #[test]
    fn last_sync_formatting() {
        let mut s = status(true, 0, DrainState::Synced);
        assert_eq!(s.format_last_sync(10_000), "Never");
        s.last_sync = Some(0);
        assert_eq!(s.format_last_sync(120_000), "2m ago");
    }

    #[test]
    fn report_counts() {
        let report = DrainReport {
            processed: 3,
            succeeded: 1,
            failed: 1,
            superseded: 1,
            errors: vec![(1, "boom".into())],
        };
        assert!(!report.is_complete());
        assert_eq!(report.settled(), 2);
    }
}
