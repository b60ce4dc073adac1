//! Sync operation queue.
//!
//! Remote propagation failures are recorded here and replayed later by a
//! drain. The queue is an ordered sequence: insertion order is retry order,
//! entries are never coalesced and never edited in place. A drain removes
//! exactly the indices it managed to replay.
//!
//! Persistence is best-effort. Read failures yield an empty queue and write
//! failures are logged; neither is reported to the caller.

use crate::durable::{Durable, DurableCell};
use crate::model::{Resume, ResumeId};
use crate::notify::{ChangeNotifier, SubscriptionId};
use crate::time::now_millis;
use folio_storage::StorageMedium;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A remote operation waiting to be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum SyncOp {
    /// Create the resume remotely.
    Create(Resume),
    /// Overwrite the remote content and title.
    Update(Resume),
    /// Delete the remote resume.
    Delete,
    /// Change the remote title.
    Rename(String),
    /// Copy the remote resume under a new id.
    Duplicate(ResumeId),
}

impl SyncOp {
    /// Returns the lowercase operation name.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncOp::Create(_) => "create",
            SyncOp::Update(_) => "update",
            SyncOp::Delete => "delete",
            SyncOp::Rename(_) => "rename",
            SyncOp::Duplicate(_) => "duplicate",
        }
    }
}

/// An operation before it is timestamped by the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOp {
    /// Resume the operation targets.
    pub resume_id: ResumeId,
    /// The operation.
    pub op: SyncOp,
}

impl PendingOp {
    /// Queues a remote create carrying the full resume.
    pub fn create(resume: Resume) -> Self {
        Self {
            resume_id: resume.id.clone(),
            op: SyncOp::Create(resume),
        }
    }

    /// Queues a remote update carrying the full resume.
    pub fn update(resume: Resume) -> Self {
        Self {
            resume_id: resume.id.clone(),
            op: SyncOp::Update(resume),
        }
    }

    /// Queues a remote delete.
    pub fn delete(id: ResumeId) -> Self {
        Self {
            resume_id: id,
            op: SyncOp::Delete,
        }
    }

    /// Queues a remote rename.
    pub fn rename(id: ResumeId, title: impl Into<String>) -> Self {
        Self {
            resume_id: id,
            op: SyncOp::Rename(title.into()),
        }
    }

    /// Queues a remote duplicate of `source` under `new_id`.
    pub fn duplicate(source: ResumeId, new_id: ResumeId) -> Self {
        Self {
            resume_id: source,
            op: SyncOp::Duplicate(new_id),
        }
    }
}

/// A queued operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Resume the operation targets.
    pub resume_id: ResumeId,
    /// The operation.
    pub op: SyncOp,
    /// When the entry was queued, epoch milliseconds.
    pub timestamp: i64,
}

impl fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.kind(), self.resume_id)
    }
}

/// The persistent sync queue.
pub struct SyncQueue<M> {
    durable: Arc<Durable<M>>,
    entries: DurableCell<Vec<QueueEntry>>,
    last_sync: DurableCell<Option<i64>>,
    notifier: ChangeNotifier,
}

impl<M: StorageMedium> SyncQueue<M> {
    /// Opens the queue stored on `durable`.
    pub fn new(durable: Arc<Durable<M>>) -> Self {
        let config = durable.config();
        let entries = DurableCell::new(config.queue_key());
        let last_sync = DurableCell::new(config.last_sync_key());
        Self {
            durable,
            entries,
            last_sync,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Appends `op`, timestamped now.
    pub fn enqueue(&self, op: PendingOp) {
        let entry = QueueEntry {
            resume_id: op.resume_id,
            op: op.op,
            timestamp: now_millis(),
        };
        tracing::info!(op = entry.op.kind(), resume = %entry.resume_id, "queued for sync");

        let ((), written) = self.entries.update(&self.durable, |entries| entries.push(entry));
        if let Err(e) = written {
            tracing::error!(error = %e, "error adding to sync queue");
        }
        self.notifier.notify();
    }

    /// Returns every queued entry in replay order.
    pub fn drain_candidates(&self) -> Vec<QueueEntry> {
        self.entries.get(&self.durable)
    }

    /// Removes the entries at `indices` and keeps the rest in order.
    ///
    /// Indices past the end are ignored. Returns the number removed.
    pub fn remove_by_index(&self, indices: &BTreeSet<usize>) -> usize {
        if indices.is_empty() {
            return 0;
        }

        let (removed, written) = self.entries.update(&self.durable, |entries| {
            let before = entries.len();
            let mut index = 0;
            entries.retain(|_| {
                let keep = !indices.contains(&index);
                index += 1;
                keep
            });
            before - entries.len()
        });
        if let Err(e) = written {
            tracing::error!(error = %e, "error updating sync queue");
        }
        self.notifier.notify();
        removed
    }

    /// Drops every entry and refreshes the last sync time.
    pub fn clear(&self) {
        if let Err(e) = self.entries.reset(&self.durable) {
            tracing::error!(error = %e, "error clearing sync queue");
        }
        self.touch_last_sync();
        self.notifier.notify();
    }

    /// Records a completed drain.
    pub fn mark_synced(&self) {
        self.touch_last_sync();
        self.notifier.notify();
    }

    /// Returns the time of the last completed drain, if any.
    pub fn last_sync_time(&self) -> Option<i64> {
        self.last_sync.get(&self.durable)
    }

    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.drain_candidates().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a callback invoked after every queue mutation.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    /// Removes a callback registered with [`SyncQueue::subscribe`].
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn touch_last_sync(&self) {
        let now = now_millis();
        let ((), written) = self.last_sync.update(&self.durable, |last| *last = Some(now));
        if let Err(e) = written {
            tracing::error!(error = %e, "error updating last sync time");
        }
    }
}

impl<M> fmt::Debug for SyncQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncQueue")
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
