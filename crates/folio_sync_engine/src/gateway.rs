//! Remote document gateway.
//!
//! The gateway is the consumed contract of the remote resume store. It has
//! no retry semantics of its own; retry belongs to the reconciler's queue.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use folio_core::{CallerIdentity, RemoteResume, ResumeId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Remote resume store.
///
/// Every call is scoped to the caller passed as its first argument.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Creates a resume under `id`. Fails if `id` already exists.
    async fn create(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        title: &str,
        content: &str,
    ) -> GatewayResult<()>;

    /// Overwrites the content and title of `id`.
    async fn update(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        content: &str,
        title: &str,
    ) -> GatewayResult<()>;

    /// Deletes `id`.
    async fn delete(&self, caller: &CallerIdentity, id: &ResumeId) -> GatewayResult<()>;

    /// Copies `source` under `new_id`.
    async fn duplicate(
        &self,
        caller: &CallerIdentity,
        source: &ResumeId,
        new_id: &ResumeId,
    ) -> GatewayResult<()>;

    /// Changes the title of `id`.
    async fn rename(&self, caller: &CallerIdentity, id: &ResumeId, title: &str)
        -> GatewayResult<()>;

    /// Lists every resume owned by `caller`.
    async fn list_all_for_caller(&self, caller: &CallerIdentity)
        -> GatewayResult<Vec<RemoteResume>>;
}

/// A gateway call, as recorded by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `create`.
    Create {
        /// Target id.
        id: ResumeId,
        /// Title sent.
        title: String,
    },
    /// `update`.
    Update {
        /// Target id.
        id: ResumeId,
    },
    /// `delete`.
    Delete {
        /// Target id.
        id: ResumeId,
    },
    /// `duplicate`.
    Duplicate {
        /// Source id.
        source: ResumeId,
        /// Id of the copy.
        new_id: ResumeId,
    },
    /// `rename`.
    Rename {
        /// Target id.
        id: ResumeId,
        /// New title.
        title: String,
    },
    /// `list_all_for_caller`.
    List,
}

impl GatewayCall {
    /// Returns the id the call targets, if any.
    pub fn target(&self) -> Option<&ResumeId> {
        match self {
            GatewayCall::Create { id, .. }
            | GatewayCall::Update { id }
            | GatewayCall::Delete { id }
            | GatewayCall::Rename { id, .. } => Some(id),
            GatewayCall::Duplicate { new_id, .. } => Some(new_id),
            GatewayCall::List => None,
        }
    }
}

type FailureRule = Box<dyn Fn(&GatewayCall) -> bool + Send + Sync>;

/// An in-memory remote store for tests and demos.
///
/// Resumes are kept per owner. Failures can be scripted with
/// [`MemoryGateway::fail_next`] and [`MemoryGateway::fail_matching`], and
/// every attempted call is appended to an ordered log.
pub struct MemoryGateway {
    resumes: RwLock<Vec<RemoteResume>>,
    connected: AtomicBool,
    latency: Mutex<Option<Duration>>,
    fail_next: Mutex<Option<GatewayError>>,
    rules: Mutex<Vec<FailureRule>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MemoryGateway {
    /// Creates an empty, connected gateway.
    pub fn new() -> Self {
        Self {
            resumes: RwLock::new(Vec::new()),
            connected: AtomicBool::new(true),
            latency: Mutex::new(None),
            fail_next: Mutex::new(None),
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the connected state. Calls fail with a retryable transport
    /// error while disconnected.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Returns true if calls currently reach the store.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Makes every call matching `predicate` fail with a retryable
    /// transport error until [`MemoryGateway::clear_failures`].
    pub fn fail_matching(&self, predicate: impl Fn(&GatewayCall) -> bool + Send + Sync + 'static) {
        self.rules.lock().push(Box::new(predicate));
    }

    /// Removes every scripted failure.
    pub fn clear_failures(&self) {
        self.fail_next.lock().take();
        self.rules.lock().clear();
    }

    /// Returns every attempted call in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Returns the stored resume with `id`, regardless of owner.
    pub fn stored(&self, id: &ResumeId) -> Option<RemoteResume> {
        self.resumes.read().iter().find(|r| &r.id == id).cloned()
    }

    /// Returns the number of stored resumes across all owners.
    pub fn len(&self) -> usize {
        self.resumes.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a resume directly, bypassing the call log.
    pub fn insert(&self, resume: RemoteResume) {
        let mut resumes = self.resumes.write();
        resumes.retain(|r| r.id != resume.id);
        resumes.push(resume);
    }

    /// Records `call` and applies connectivity, latency and scripted failures.
    async fn admit(&self, caller: &CallerIdentity, call: GatewayCall) -> GatewayResult<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self.fail_next.lock().take();
        let matched = self.rules.lock().iter().any(|rule| rule(&call));
        self.calls.lock().push(call);

        if !self.is_connected() {
            return Err(GatewayError::transport_retryable("network unreachable"));
        }
        if let Some(error) = injected {
            return Err(error);
        }
        if matched {
            return Err(GatewayError::transport_retryable("injected failure"));
        }
        if caller.as_str().is_empty() {
            return Err(GatewayError::Unauthorized("anonymous caller".to_string()));
        }
        Ok(())
    }

    /// Runs `f` on the caller's resume with `id`.
    fn with_owned<R>(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        f: impl FnOnce(&mut RemoteResume) -> R,
    ) -> GatewayResult<R> {
        let mut resumes = self.resumes.write();
        let resume = resumes
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        if &resume.owner != caller {
            return Err(GatewayError::Unauthorized(format!(
                "{caller} does not own {id}"
            )));
        }
        Ok(f(resume))
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGateway")
            .field("resumes", &self.len())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn create(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        title: &str,
        content: &str,
    ) -> GatewayResult<()> {
        self.admit(
            caller,
            GatewayCall::Create {
                id: id.clone(),
                title: title.to_string(),
            },
        )
        .await?;

        let mut resumes = self.resumes.write();
        if resumes.iter().any(|r| &r.id == id) {
            return Err(GatewayError::AlreadyExists(id.to_string()));
        }
        resumes.push(RemoteResume {
            id: id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            owner: caller.clone(),
        });
        Ok(())
    }

    async fn update(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        content: &str,
        title: &str,
    ) -> GatewayResult<()> {
        self.admit(caller, GatewayCall::Update { id: id.clone() })
            .await?;
        self.with_owned(caller, id, |resume| {
            resume.content = content.to_string();
            resume.title = title.to_string();
        })
    }

    async fn delete(&self, caller: &CallerIdentity, id: &ResumeId) -> GatewayResult<()> {
        self.admit(caller, GatewayCall::Delete { id: id.clone() })
            .await?;
        self.with_owned(caller, id, |_| ())?;
        self.resumes.write().retain(|r| &r.id != id);
        Ok(())
    }

    async fn duplicate(
        &self,
        caller: &CallerIdentity,
        source: &ResumeId,
        new_id: &ResumeId,
    ) -> GatewayResult<()> {
        self.admit(
            caller,
            GatewayCall::Duplicate {
                source: source.clone(),
                new_id: new_id.clone(),
            },
        )
        .await?;

        let mut copy = self.with_owned(caller, source, |resume| resume.clone())?;
        let mut resumes = self.resumes.write();
        if resumes.iter().any(|r| &r.id == new_id) {
            return Err(GatewayError::AlreadyExists(new_id.to_string()));
        }
        copy.id = new_id.clone();
        copy.title = format!("{} (Copy)", copy.title);
        resumes.push(copy);
        Ok(())
    }

    async fn rename(
        &self,
        caller: &CallerIdentity,
        id: &ResumeId,
        title: &str,
    ) -> GatewayResult<()> {
        self.admit(
            caller,
            GatewayCall::Rename {
                id: id.clone(),
                title: title.to_string(),
            },
        )
        .await?;
        self.with_owned(caller, id, |resume| resume.title = title.to_string())
    }

    async fn list_all_for_caller(
        &self,
        caller: &CallerIdentity,
    ) -> GatewayResult<Vec<RemoteResume>> {
        self.admit(caller, GatewayCall::List).await?;
        Ok(self
            .resumes
            .read()
            .iter()
            .filter(|r| &r.owner == caller)
            .cloned()
            .collect())
    }
}

/// A gateway with no remote behind it.
///
/// Every call fails with a non-retryable transport error. Used where the
/// store runs without any remote, as in the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disconnected;

impl Disconnected {
    fn refuse<T>() -> GatewayResult<T> {
        Err(GatewayError::transport_fatal("no remote store configured"))
    }
}

#[async_trait]
impl RemoteGateway for Disconnected {
    async fn create(&self, _: &CallerIdentity, _: &ResumeId, _: &str, _: &str) -> GatewayResult<()> {
        Self::refuse()
    }

    async fn update(&self, _: &CallerIdentity, _: &ResumeId, _: &str, _: &str) -> GatewayResult<()> {
        Self::refuse()
    }

    async fn delete(&self, _: &CallerIdentity, _: &ResumeId) -> GatewayResult<()> {
        Self::refuse()
    }

    async fn duplicate(&self, _: &CallerIdentity, _: &ResumeId, _: &ResumeId) -> GatewayResult<()> {
        Self::refuse()
    }

    async fn rename(&self, _: &CallerIdentity, _: &ResumeId, _: &str) -> GatewayResult<()> {
        Self::refuse()
    }

    async fn list_all_for_caller(&self, _: &CallerIdentity) -> GatewayResult<Vec<RemoteResume>> {
        Self::refuse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> CallerIdentity {
        CallerIdentity::new("alice")
    }

    #[tokio::test]
    async fn create_then_list() {
        let gateway = MemoryGateway::new();
        let id = ResumeId::from("r1");
        gateway.create(&alice(), &id, "CV", "{}").await.unwrap();

        let listed = gateway.list_all_for_caller(&alice()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner, alice());

        let bob = CallerIdentity::new("bob");
        assert!(gateway.list_all_for_caller(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_twice_already_exists() {
        let gateway = MemoryGateway::new();
        let id = ResumeId::from("r1");
        gateway.create(&alice(), &id, "CV", "{}").await.unwrap();

        let err = gateway.create(&alice(), &id, "CV", "{}").await.unwrap_err();
        assert_eq!(err, GatewayError::AlreadyExists("r1".to_string()));
    }

    #[tokio::test]
    async fn missing_resume_not_found() {
        let gateway = MemoryGateway::new();
        let err = gateway
            .rename(&alice(), &ResumeId::from("nope"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_owner_is_unauthorized() {
        let gateway = MemoryGateway::new();
        let id = ResumeId::from("r1");
        gateway.create(&alice(), &id, "CV", "{}").await.unwrap();

        let err = gateway
            .delete(&CallerIdentity::new("mallory"), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
        assert!(gateway.stored(&id).is_some());
    }

    #[tokio::test]
    async fn duplicate_appends_copy_suffix() {
        let gateway = MemoryGateway::new();
        let (source, copy) = (ResumeId::from("r1"), ResumeId::from("r2"));
        gateway.create(&alice(), &source, "CV", "{}").await.unwrap();
        gateway.duplicate(&alice(), &source, &copy).await.unwrap();

        assert_eq!(gateway.stored(&copy).unwrap().title, "CV (Copy)");
    }

    #[tokio::test]
    async fn scripted_failures_are_logged() {
        let gateway = MemoryGateway::new();
        gateway.fail_next(GatewayError::Remote("boom".into()));
        gateway.fail_matching(|call| matches!(call, GatewayCall::Delete { .. }));

        let id = ResumeId::from("r1");
        assert!(gateway.create(&alice(), &id, "CV", "{}").await.is_err());
        gateway.create(&alice(), &id, "CV", "{}").await.unwrap();
        assert!(gateway.delete(&alice(), &id).await.unwrap_err().is_retryable());

        gateway.clear_failures();
        gateway.delete(&alice(), &id).await.unwrap();
        assert_eq!(gateway.calls().len(), 4);
    }

    #[tokio::test]
    async fn disconnected_is_retryable() {
        let gateway = MemoryGateway::new();
        gateway.set_connected(false);
        let err = gateway.list_all_for_caller(&alice()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn no_remote_refuses_everything() {
        let err = Disconnected
            .list_all_for_caller(&alice())
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
