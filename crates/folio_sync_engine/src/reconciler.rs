//! Reconciliation between the local store and the remote store.
//!
//! Every user operation writes locally first. A local failure is the
//! operation's failure. The remote store is then updated on a best-effort
//! basis: while signed in, a failed or impossible remote call turns into a
//! queue entry and never fails the operation. While signed out, changes
//! stay local and nothing is queued.
//!
//! ## Local-only resumes
//!
//! A resume whose origin is [`Origin::LocalOnly`] has no remote counterpart
//! yet. Updates, renames and deletes of such a resume are never sent or
//! queued; the pending `create` carries the freshest local copy when it is
//! replayed, and a deleted resume supersedes its `create`.
//!
//! ## Draining
//!
//! A drain replays the queue in order, attempts every entry once, and then
//! removes exactly the entries that were settled. At most one drain runs at
//! a time.

use crate::config::SyncConfig;
use crate::error::{GatewayError, GatewayResult, SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::presence::Presence;
use crate::state::{DrainReport, DrainState, SyncStats, SyncStatus};
use folio_core::{
    classify, decode_remote, encode_blob, now_millis, CallerIdentity, Config, CoreError,
    LocalStore, Origin, PendingOp, Resume, ResumeId, SyncOp, SyncQueue,
};
use folio_storage::StorageMedium;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a remote call for one operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replayed {
    /// The remote store has the change.
    Done,
    /// The local resume is gone; nothing to send.
    Superseded,
}

/// Clears the in-flight flag when a drain ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates the local store, the sync queue and the remote gateway.
pub struct Reconciler<G: RemoteGateway, M: StorageMedium> {
    config: SyncConfig,
    gateway: Arc<G>,
    store: LocalStore<M>,
    queue: SyncQueue<M>,
    presence: RwLock<Presence>,
    state: RwLock<DrainState>,
    stats: RwLock<SyncStats>,
    draining: AtomicBool,
}

impl<G: RemoteGateway, M: StorageMedium> Reconciler<G, M> {
    /// Creates a reconciler over an opened store and queue.
    ///
    /// Presence starts offline and signed out.
    pub fn new(config: SyncConfig, gateway: G, store: LocalStore<M>, queue: SyncQueue<M>) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
            store,
            queue,
            presence: RwLock::new(Presence::offline()),
            state: RwLock::new(DrainState::Idle),
            stats: RwLock::new(SyncStats::default()),
            draining: AtomicBool::new(false),
        }
    }

    /// Opens the store and queue on `medium` and creates a reconciler.
    pub fn open(config: SyncConfig, gateway: G, medium: M, store_config: Config) -> Self {
        let (store, queue) = folio_core::open(medium, store_config);
        Self::new(config, gateway, store, queue)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the remote gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the local store.
    pub fn store(&self) -> &LocalStore<M> {
        &self.store
    }

    /// Returns the sync queue.
    pub fn queue(&self) -> &SyncQueue<M> {
        &self.queue
    }

    /// Returns the current presence.
    pub fn presence(&self) -> Presence {
        self.presence.read().clone()
    }

    /// Replaces the presence. Call [`Reconciler::on_presence_change`]
    /// afterwards to react to it.
    pub fn set_presence(&self, presence: Presence) {
        *self.presence.write() = presence;
    }

    /// Sets the connectivity signal.
    pub fn set_online(&self, online: bool) {
        self.presence.write().online = online;
    }

    /// Sets or clears the caller identity.
    pub fn set_identity(&self, identity: Option<CallerIdentity>) {
        self.presence.write().identity = identity;
    }

    /// Clears the caller identity.
    pub fn sign_out(&self) {
        self.set_identity(None);
    }

    /// Gets the current drain state.
    pub fn state(&self) -> DrainState {
        *self.state.read()
    }

    /// Gets the drain statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns true while a drain is in flight.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Returns the data behind the sync status badge.
    pub fn status(&self) -> SyncStatus {
        let presence = self.presence();
        SyncStatus {
            online: presence.online,
            authenticated: presence.is_authenticated(),
            pending: self.queue.len(),
            last_sync: self.queue.last_sync_time(),
            state: self.state(),
            storage: self.store.status(),
        }
    }

    /// Creates a resume.
    ///
    /// Without a caller identity the resume stays local-only and nothing is
    /// queued; see [`Reconciler::publish_local_only`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Local`] if the local write failed.
    pub async fn create(&self, title: &str) -> SyncResult<Resume> {
        let resume = self.store.create(title)?;
        self.propagate(PendingOp::create(resume.clone())).await;
        Ok(self.refreshed(resume))
    }

    /// Saves an edited resume.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Local`] if the local write failed.
    pub async fn update(&self, resume: Resume) -> SyncResult<Resume> {
        let saved = self.store.put(resume)?;

        if saved.origin.is_local_only() {
            tracing::debug!(resume = %saved.id, "local-only resume updated, nothing to propagate");
        } else {
            self.propagate(PendingOp::update(saved.clone())).await;
        }
        Ok(saved)
    }

    /// Deletes a resume. Returns false if it was not stored locally.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Local`] if the local write failed.
    pub async fn delete(&self, id: &ResumeId) -> SyncResult<bool> {
        let local_only = self.store.is_local_only(id);
        let existed = self.store.delete(id)?;

        if !local_only {
            self.propagate(PendingOp::delete(id.clone())).await;
        }
        Ok(existed)
    }

    /// Renames a resume.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Local`] if the resume does not exist locally,
    /// the title is blank, or the local write failed.
    pub async fn rename(&self, id: &ResumeId, title: &str) -> SyncResult<Resume> {
        let renamed = self.store.rename(id, title)?;

        if !renamed.origin.is_local_only() {
            self.propagate(PendingOp::rename(id.clone(), renamed.title.clone()))
                .await;
        }
        Ok(renamed)
    }

    /// Duplicates a resume under a fresh local id.
    ///
    /// A copy of a local-only resume is propagated as a create of the copy.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Local`] if the source does not exist locally or
    /// the local write failed.
    pub async fn duplicate(&self, id: &ResumeId) -> SyncResult<Resume> {
        let source_local_only = self.store.is_local_only(id);
        let copy = self
            .store
            .duplicate(id)?
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;

        let op = if source_local_only {
            PendingOp::create(copy.clone())
        } else {
            PendingOp::duplicate(id.clone(), copy.id.clone())
        };
        self.propagate(op).await;
        Ok(self.refreshed(copy))
    }

    /// Lists every resume visible to the user.
    ///
    /// When online and signed in, remote copies are authoritative and
    /// local-only resumes are added; otherwise the local set is returned.
    /// A failed remote listing falls back to the local set.
    pub async fn list(&self) -> Vec<Resume> {
        let local = self.store.get_all();
        let Some(caller) = self.ready_caller() else {
            return local;
        };

        let remote = match self.gateway.list_all_for_caller(&caller).await {
            Ok(remote) => remote,
            Err(e) => {
                self.log_remote_failure("list", None, &e);
                return local;
            }
        };

        let now = now_millis();
        let mut merged: Vec<Resume> = remote
            .iter()
            .filter_map(|r| match decode_remote(r, now) {
                Ok(resume) => Some(resume),
                Err(e) => {
                    tracing::warn!(resume = %r.id, error = %e, "skipping undecodable remote resume");
                    None
                }
            })
            .collect();

        let known: HashSet<ResumeId> = merged.iter().map(|r| r.id.clone()).collect();
        merged.extend(
            local
                .into_iter()
                .filter(|r| r.origin.is_local_only() && !known.contains(&r.id)),
        );
        merged
    }

    /// Returns one resume.
    ///
    /// The local copy wins when there is one, so that the last successful
    /// local write is always what is read back. Resumes not stored locally
    /// are looked up remotely when online and signed in.
    pub async fn get(&self, id: &ResumeId) -> Option<Resume> {
        if let Some(local) = self.store.get(id) {
            return Some(local);
        }
        let caller = self.ready_caller()?;

        match self.gateway.list_all_for_caller(&caller).await {
            Ok(remote) => remote
                .iter()
                .find(|r| &r.id == id)
                .and_then(|r| decode_remote(r, now_millis()).ok()),
            Err(e) => {
                self.log_remote_failure("get", Some(id), &e);
                None
            }
        }
    }

    /// Replays the sync queue against the remote store.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Unavailable`] when offline or signed out
    /// - [`SyncError::AlreadyDraining`] when another drain is in flight
    /// - [`SyncError::PartialSync`] when some entries failed
    /// - [`SyncError::DrainFailed`] when every entry failed
    pub async fn drain(&self) -> SyncResult<DrainReport> {
        let caller = self.presence.read().require_ready()?;
        let _guard = DrainGuard::acquire(&self.draining).ok_or(SyncError::AlreadyDraining)?;

        let entries = self.queue.drain_candidates();
        if entries.is_empty() {
            tracing::debug!("sync queue is empty");
            return Ok(DrainReport::default());
        }

        self.set_state(DrainState::Draining);
        tracing::info!(entries = entries.len(), "draining sync queue");

        let mut report = DrainReport {
            processed: entries.len(),
            ..DrainReport::default()
        };
        let mut settled = BTreeSet::new();

        for (index, entry) in entries.iter().enumerate() {
            match self.replay(&caller, &entry.resume_id, &entry.op).await {
                Ok(Replayed::Done) => {
                    report.succeeded += 1;
                    settled.insert(index);
                }
                Ok(Replayed::Superseded) => {
                    tracing::debug!(entry = %entry, "queued operation superseded by local delete");
                    report.superseded += 1;
                    settled.insert(index);
                }
                Err(e) => {
                    self.log_remote_failure(entry.op.kind(), Some(&entry.resume_id), &e);
                    report.failed += 1;
                    report.errors.push((index, classify(&e).user_message));
                }
            }
        }

        self.queue.remove_by_index(&settled);
        self.finish_drain(report)
    }

    /// Reacts to a presence change.
    ///
    /// Drains when online, signed in and not already draining. Returns
    /// `Ok(None)` when no drain was started.
    ///
    /// # Errors
    ///
    /// Returns the drain's error, see [`Reconciler::drain`].
    pub async fn on_presence_change(&self) -> SyncResult<Option<DrainReport>> {
        let ready = self.ready_caller().is_some();
        if !ready || self.is_draining() {
            return Ok(None);
        }

        let drained = if self.config.drain_on_reconnect {
            self.drain().await.map(Some)
        } else {
            Ok(None)
        };

        if self.config.publish_local_only_on_reconnect {
            if let Err(e) = self.publish_local_only().await {
                tracing::warn!(error = %e, "failed to publish local-only resumes");
            }
        }
        drained
    }

    /// Creates every local-only resume remotely.
    ///
    /// Resumes with a pending `create` or `duplicate` entry are skipped.
    /// Failures are queued. Returns the number of resumes published.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unavailable`] when offline or signed out.
    pub async fn publish_local_only(&self) -> SyncResult<usize> {
        let caller = self.presence.read().require_ready()?;

        let pending: HashSet<ResumeId> = self
            .queue
            .drain_candidates()
            .into_iter()
            .filter_map(|entry| match entry.op {
                SyncOp::Create(_) => Some(entry.resume_id),
                SyncOp::Duplicate(new_id) => Some(new_id),
                _ => None,
            })
            .collect();

        let mut published = 0;
        let candidates = self
            .store
            .get_all()
            .into_iter()
            .filter(|r| r.origin.is_local_only() && !pending.contains(&r.id));

        for resume in candidates {
            let op = PendingOp::create(resume);
            match self.replay(&caller, &op.resume_id, &op.op).await {
                Ok(Replayed::Done) => published += 1,
                Ok(Replayed::Superseded) => {}
                Err(e) => {
                    self.log_remote_failure("create", Some(&op.resume_id), &e);
                    self.queue.enqueue(op);
                }
            }
        }

        if published > 0 {
            tracing::info!(published, "published local-only resumes");
        }
        Ok(published)
    }

    /// Sends `op` now if possible, otherwise queues it.
    ///
    /// Queue entries carry no owner, so nothing is sent or queued while
    /// signed out.
    async fn propagate(&self, op: PendingOp) {
        let Presence { online, identity } = self.presence();
        let Some(caller) = identity else {
            tracing::debug!(op = op.op.kind(), resume = %op.resume_id, "signed out, change stays local");
            return;
        };

        if online {
            match self.replay(&caller, &op.resume_id, &op.op).await {
                Ok(_) => return,
                Err(e) => self.log_remote_failure(op.op.kind(), Some(&op.resume_id), &e),
            }
        }
        self.queue.enqueue(op);
    }

    /// Dispatches one operation to the remote store.
    async fn replay(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        op: &SyncOp,
    ) -> GatewayResult<Replayed> {
        match op {
            SyncOp::Create(_) => {
                let Some(fresh) = self.store.get(id) else {
                    return Ok(Replayed::Superseded);
                };
                let content = blob(&fresh)?;
                match self.gateway.create(caller, id, &fresh.title, &content).await {
                    Ok(()) => {}
                    Err(GatewayError::AlreadyExists(_)) => {
                        self.gateway
                            .update(caller, id, &content, &fresh.title)
                            .await?;
                    }
                    Err(e) => return Err(e),
                }
                self.mark_remote(id);
            }
            SyncOp::Update(resume) => {
                self.gateway
                    .update(caller, id, &blob(resume)?, &resume.title)
                    .await?;
            }
            SyncOp::Delete => match self.gateway.delete(caller, id).await {
                Ok(()) | Err(GatewayError::NotFound(_)) => {}
                Err(e) => return Err(e),
            },
            SyncOp::Rename(title) => {
                self.gateway.rename(caller, id, title).await?;
            }
            SyncOp::Duplicate(new_id) => {
                let Some(copy) = self.store.get(new_id) else {
                    return Ok(Replayed::Superseded);
                };
                match self.gateway.duplicate(caller, id, new_id).await {
                    Ok(()) | Err(GatewayError::AlreadyExists(_)) => {}
                    Err(e) => return Err(e),
                }
                if copy.updated_at > copy.created_at {
                    self.gateway
                        .update(caller, new_id, &blob(&copy)?, &copy.title)
                        .await?;
                }
                self.mark_remote(new_id);
            }
        }
        Ok(Replayed::Done)
    }

    fn finish_drain(&self, report: DrainReport) -> SyncResult<DrainReport> {
        let outcome = if report.is_complete() {
            self.queue.mark_synced();
            tracing::info!(replayed = report.succeeded, "sync queue drained");
            Ok(())
        } else if report.settled() > 0 {
            Err(SyncError::PartialSync {
                succeeded: report.settled(),
                failed: report.failed,
            })
        } else {
            Err(SyncError::DrainFailed {
                failed: report.failed,
            })
        };

        let state = match &outcome {
            Ok(()) => DrainState::Synced,
            Err(SyncError::PartialSync { .. }) => DrainState::Partial,
            Err(_) => DrainState::Error,
        };
        self.set_state(state);

        {
            let mut stats = self.stats.write();
            stats.drains_completed += 1;
            stats.operations_replayed += report.succeeded as u64;
            stats.operations_failed += report.failed as u64;
            stats.last_error = outcome.as_ref().err().map(ToString::to_string);
            stats.last_report = Some(report.clone());
        }

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "sync incomplete");
        }
        outcome.map(|()| report)
    }

    fn ready_caller(&self) -> Option<CallerIdentity> {
        self.presence.read().ready_caller().cloned()
    }

    fn set_state(&self, state: DrainState) {
        *self.state.write() = state;
    }

    fn refreshed(&self, resume: Resume) -> Resume {
        self.store.get(&resume.id).unwrap_or(resume)
    }

    fn mark_remote(&self, id: &ResumeId) {
        if let Err(e) = self.store.set_origin(id, Origin::Remote) {
            tracing::warn!(resume = %id, error = %e, "failed to record remote origin");
        }
    }

    fn log_remote_failure(&self, op: &str, id: Option<&ResumeId>, error: &GatewayError) {
        let classified = classify(error);
        match id {
            Some(id) => tracing::warn!(op, resume = %id, error = %classified.user_message, "remote call failed"),
            None => tracing::warn!(op, error = %classified.user_message, "remote call failed"),
        }
        tracing::debug!(op, error = %classified.full_error, retryable = error.is_retryable(), "remote failure detail");
    }
}

fn blob(resume: &Resume) -> GatewayResult<String> {
    encode_blob(resume).map_err(|e| {
        GatewayError::transport_fatal(format!("failed to encode resume {}: {e}", resume.id))
    })
}
