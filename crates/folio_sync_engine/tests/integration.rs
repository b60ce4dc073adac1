//! Integration tests for the reconciler against an in-memory remote store.

use folio_core::{Config, Origin, ResumeId, SyncOp};
use folio_storage::{InMemoryMedium, StorageMedium};
use folio_sync_engine::{
    DrainState, GatewayCall, GatewayError, MemoryGateway, Presence, Reconciler, RemoteGateway,
    SyncConfig, SyncError,
};
use folio_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

type MemoryReconciler = Reconciler<MemoryGateway, InMemoryMedium>;

fn alice() -> folio_core::CallerIdentity {
    folio_core::CallerIdentity::new("alice")
}

fn reconciler() -> MemoryReconciler {
    Reconciler::open(
        SyncConfig::default(),
        MemoryGateway::new(),
        InMemoryMedium::new(),
        Config::default(),
    )
}

/// Signed in, but the device is offline.
fn offline_signed_in<G: RemoteGateway, M: StorageMedium>(r: &Reconciler<G, M>) {
    r.set_presence(Presence {
        online: false,
        identity: Some(alice()),
    });
}

fn queued_kinds(r: &MemoryReconciler) -> Vec<&'static str> {
    r.queue()
        .drain_candidates()
        .iter()
        .map(|e| e.op.kind())
        .collect()
}

#[tokio::test]
async fn local_write_is_final_without_remote() {
    let r = reconciler();
    offline_signed_in(&r);

    let created = r.create("CV").await.unwrap();
    assert_eq!(r.get(&created.id).await.unwrap().title, "CV");

    let mut edited = created.clone();
    edited.content.summary = "first".to_string();
    r.update(edited.clone()).await.unwrap();
    assert_eq!(r.get(&created.id).await.unwrap().content.summary, "first");

    edited.content.summary = "second".to_string();
    r.update(edited).await.unwrap();
    assert_eq!(r.get(&created.id).await.unwrap().content.summary, "second");

    r.delete(&created.id).await.unwrap();
    assert!(r.get(&created.id).await.is_none());
}

#[tokio::test]
async fn local_write_is_final_with_failing_remote() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let created = r.create("CV").await.unwrap();
    assert_eq!(created.origin, Origin::Remote);

    r.gateway().set_connected(false);
    let mut edited = created.clone();
    edited.content.summary = "offline edit".to_string();
    r.update(edited).await.unwrap();

    assert_eq!(
        r.get(&created.id).await.unwrap().content.summary,
        "offline edit"
    );
    assert_eq!(queued_kinds(&r), ["update"]);
}

#[tokio::test]
async fn queue_replays_in_order() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let resume = r.create("CV").await.unwrap();

    r.set_online(false);
    r.rename(&resume.id, "Renamed").await.unwrap();
    let mut edited = r.store().get(&resume.id).unwrap();
    edited.content.summary = "edited".to_string();
    r.update(edited).await.unwrap();
    assert_eq!(queued_kinds(&r), ["rename", "update"]);

    r.gateway().clear_calls();
    r.set_online(true);
    let report = r.drain().await.unwrap();
    assert_eq!(report.succeeded, 2);

    let calls = r.gateway().calls();
    assert!(matches!(calls[0], GatewayCall::Rename { .. }));
    assert!(matches!(calls[1], GatewayCall::Update { .. }));
    assert!(r.queue().is_empty());
    assert!(r.queue().last_sync_time().is_some());
    assert_eq!(r.state(), DrainState::Synced);
}

#[tokio::test]
async fn partial_drain_retains_failures() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let a = r.create("A").await.unwrap();
    let b = r.create("B").await.unwrap();
    let c = r.create("C").await.unwrap();

    r.set_online(false);
    r.rename(&a.id, "A2").await.unwrap();
    r.rename(&b.id, "B2").await.unwrap();
    r.rename(&c.id, "C2").await.unwrap();
    let before = r.queue().last_sync_time();

    let failing = b.id.clone();
    r.gateway()
        .fail_matching(move |call| call.target() == Some(&failing));
    r.set_online(true);

    let err = r.drain().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::PartialSync {
            succeeded: 2,
            failed: 1
        }
    ));
    assert!(err.user_message().contains("partially completed"));

    let remaining = r.queue().drain_candidates();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].resume_id, b.id);
    assert_eq!(remaining[0].op, SyncOp::Rename("B2".to_string()));
    assert_eq!(r.queue().last_sync_time(), before);
    assert_eq!(r.state(), DrainState::Partial);

    let stats = r.stats();
    let report = stats.last_report.unwrap();
    assert_eq!((report.succeeded, report.failed), (2, 1));
    assert_eq!(report.errors[0].0, 1);

    r.gateway().clear_failures();
    let report = r.drain().await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(r.queue().is_empty());
}

#[tokio::test]
async fn drain_that_settles_nothing_fails() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let a = r.create("A").await.unwrap();

    r.set_online(false);
    r.rename(&a.id, "A2").await.unwrap();
    r.set_online(true);
    r.gateway().fail_matching(|_| true);

    let err = r.drain().await.unwrap_err();
    assert!(matches!(err, SyncError::DrainFailed { failed: 1 }));
    assert_eq!(r.state(), DrainState::Error);
    assert_eq!(r.queue().len(), 1);
}

#[tokio::test]
async fn drain_attempts_every_entry() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let ids: Vec<ResumeId> = {
        let mut ids = Vec::new();
        for title in ["A", "B", "C", "D"] {
            ids.push(r.create(title).await.unwrap().id);
        }
        ids
    };

    r.set_online(false);
    for id in &ids {
        r.delete(id).await.unwrap();
    }
    r.set_online(true);
    r.gateway().clear_calls();
    let first = ids[0].clone();
    r.gateway()
        .fail_matching(move |call| call.target() == Some(&first));

    assert!(r.drain().await.is_err());
    assert_eq!(r.gateway().calls().len(), 4);
    assert_eq!(r.queue().len(), 1);
}

#[tokio::test]
async fn drain_unavailable_offline_or_signed_out() {
    let r = reconciler();
    offline_signed_in(&r);
    let err = r.drain().await.unwrap_err();
    assert!(err.to_string().contains("Cannot sync"));
    assert_eq!(
        err.user_message(),
        "Unable to sync while offline. Changes will sync when you reconnect."
    );

    r.set_presence(Presence {
        online: true,
        identity: None,
    });
    assert!(matches!(
        r.drain().await,
        Err(SyncError::Unavailable {
            online: true,
            authenticated: false
        })
    ));
}

#[tokio::test]
async fn at_most_one_drain_in_flight() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let a = r.create("A").await.unwrap();
    r.set_online(false);
    r.rename(&a.id, "A2").await.unwrap();
    r.set_online(true);

    r.gateway().set_latency(Duration::from_millis(20));
    let (first, second) = tokio::join!(r.drain(), r.drain());

    assert_eq!(first.unwrap().succeeded, 1);
    assert!(matches!(second, Err(SyncError::AlreadyDraining)));
    assert!(!r.is_draining());
}

#[tokio::test]
async fn degrade_to_memory_when_probe_fails() {
    let medium = Arc::new(FaultyMedium::unavailable());
    let (store, queue) = faulty_store(&medium);
    let r = Reconciler::new(SyncConfig::default(), MemoryGateway::new(), store, queue);

    let created = r.create("CV").await.unwrap();
    let mut edited = created.clone();
    edited.content.summary = "kept".to_string();
    r.update(edited).await.unwrap();
    let other = r.create("Other").await.unwrap();
    r.delete(&other.id).await.unwrap();

    let all = r.list().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content.summary, "kept");

    let status = r.status();
    assert!(!status.storage.available);
    assert!(status.storage.using_memory);
    assert_eq!(medium.writes(), 0);
}

#[tokio::test]
async fn failed_durable_write_is_reported_but_kept() {
    let medium = Arc::new(FaultyMedium::new());
    let (store, queue) = faulty_store(&medium);
    let r = Reconciler::new(SyncConfig::default(), MemoryGateway::new(), store, queue);
    let created = r.create("CV").await.unwrap();

    medium.break_writes();
    let err = r.rename(&created.id, "Renamed").await.unwrap_err();
    assert!(folio_core::is_storage_fault(&err));
    assert_eq!(r.get(&created.id).await.unwrap().title, "Renamed");
}

#[tokio::test]
async fn local_only_id_never_queued_for_update() {
    let r = reconciler();
    offline_signed_in(&r);

    let created = r.create("CV").await.unwrap();
    let mut edited = created.clone();
    edited.content.summary = "latest".to_string();
    r.update(edited).await.unwrap();
    r.rename(&created.id, "Renamed").await.unwrap();

    assert_eq!(queued_kinds(&r), ["create"]);

    r.set_online(true);
    r.drain().await.unwrap();
    let remote = r.gateway().stored(&created.id).unwrap();
    assert_eq!(remote.title, "Renamed");
    assert!(remote.content.contains("latest"));
    assert_eq!(r.store().get(&created.id).unwrap().origin, Origin::Remote);
}

#[tokio::test]
async fn signed_out_edits_queue_nothing() {
    let r = reconciler();
    let created = r.create("CV").await.unwrap();
    let mut edited = created.clone();
    edited.content.summary = "x".to_string();
    r.update(edited).await.unwrap();
    r.delete(&created.id).await.unwrap();

    assert!(r.queue().is_empty());
}

#[tokio::test]
async fn signed_out_edits_of_synced_resume_stay_local() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let created = r.create("CV").await.unwrap();
    assert_eq!(created.origin, Origin::Remote);

    r.sign_out();
    r.rename(&created.id, "Renamed").await.unwrap();
    let copy = r.duplicate(&created.id).await.unwrap();
    r.delete(&created.id).await.unwrap();
    assert!(r.queue().is_empty());
    assert!(r.store().get(&copy.id).is_some());

    r.set_identity(Some(folio_core::CallerIdentity::new("bob")));
    let report = r.drain().await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(r.gateway().stored(&created.id).unwrap().title, "CV");
}

#[tokio::test]
async fn deleted_before_drain_supersedes_create() {
    let r = reconciler();
    offline_signed_in(&r);
    let created = r.create("CV").await.unwrap();
    r.delete(&created.id).await.unwrap();
    assert_eq!(queued_kinds(&r), ["create"]);

    r.set_online(true);
    let report = r.drain().await.unwrap();
    assert_eq!(report.superseded, 1);
    assert!(r.gateway().calls().is_empty());
    assert!(r.queue().is_empty());
}

#[tokio::test]
async fn duplicate_twice_gives_distinct_copies() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let mut source = r.create("CV").await.unwrap();
    source.content.summary = "original".to_string();
    let source = r.update(source).await.unwrap();

    let a = r.duplicate(&source.id).await.unwrap();
    let b = r.duplicate(&source.id).await.unwrap();

    assert_ne!(a.id, source.id);
    assert_ne!(b.id, source.id);
    assert_ne!(a.id, b.id);
    assert_eq!(a.title, "CV (Copy)");
    assert_eq!(b.title, "CV (Copy)");
    assert_eq!(a.content, source.content);
    assert_eq!(b.content, source.content);
    assert_eq!(a.origin, Origin::Remote);
    assert!(r.gateway().stored(&b.id).is_some());
}

#[tokio::test]
async fn duplicate_missing_is_not_found() {
    let r = reconciler();
    let err = r.duplicate(&ResumeId::from("nope")).await.unwrap_err();
    assert_eq!(err.user_message(), "Resume not found");
}

#[tokio::test]
async fn queued_duplicate_replays_after_reconnect() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let source = r.create("CV").await.unwrap();

    r.set_online(false);
    let copy = r.duplicate(&source.id).await.unwrap();
    assert_eq!(copy.origin, Origin::LocalOnly);
    assert_eq!(queued_kinds(&r), ["duplicate"]);

    r.set_online(true);
    let report = r.on_presence_change().await.unwrap().unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(r.store().get(&copy.id).unwrap().origin, Origin::Remote);
    assert!(r.gateway().stored(&copy.id).is_some());
}

#[tokio::test]
async fn list_prefers_remote_and_keeps_local_only() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    let remote = r.create("Remote").await.unwrap();

    r.sign_out();
    let local = r.create("Local").await.unwrap();
    r.set_identity(Some(alice()));

    r.gateway()
        .update(&alice(), &remote.id, r#"{"content":{"summary":"from elsewhere"}}"#, "Remote v2")
        .await
        .unwrap();

    let listed = r.list().await;
    assert_eq!(listed.len(), 2);
    let from_remote = listed.iter().find(|d| d.id == remote.id).unwrap();
    assert_eq!(from_remote.title, "Remote v2");
    assert_eq!(from_remote.content.summary, "from elsewhere");
    assert!(from_remote.created_at > 0);
    assert!(listed.iter().any(|d| d.id == local.id));
}

#[tokio::test]
async fn list_falls_back_to_local() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    r.create("A").await.unwrap();
    r.gateway().set_connected(false);

    assert_eq!(r.list().await.len(), 1);

    r.set_online(false);
    assert_eq!(r.list().await.len(), 1);
}

#[tokio::test]
async fn publish_local_only_on_reconnect() {
    let r = Reconciler::open(
        SyncConfig::default().with_publish_local_only_on_reconnect(true),
        MemoryGateway::new(),
        InMemoryMedium::new(),
        Config::default(),
    );
    let created = r.create("Written while signed out").await.unwrap();
    assert!(r.queue().is_empty());

    r.set_presence(Presence::signed_in(alice()));
    let report = r.on_presence_change().await.unwrap().unwrap();
    assert_eq!(report.processed, 0);

    assert!(r.gateway().stored(&created.id).is_some());
    assert_eq!(r.store().get(&created.id).unwrap().origin, Origin::Remote);
}

#[tokio::test]
async fn presence_change_ignored_when_not_ready() {
    let r = reconciler();
    offline_signed_in(&r);
    r.create("CV").await.unwrap();

    assert!(r.on_presence_change().await.unwrap().is_none());
    assert_eq!(r.queue().len(), 1);
}

#[tokio::test]
async fn remote_rejection_is_swallowed() {
    let r = reconciler();
    r.set_presence(Presence::signed_in(alice()));
    r.gateway()
        .fail_next(GatewayError::Unauthorized("session expired".into()));

    let created = r.create("CV").await.unwrap();
    assert_eq!(created.title, "CV");
    assert_eq!(queued_kinds(&r), ["create"]);
}

#[tokio::test]
async fn status_reports_pending_and_last_sync() {
    let r = reconciler();
    offline_signed_in(&r);
    r.create("CV").await.unwrap();

    let status = r.status();
    assert_eq!(status.pending, 1);
    assert_eq!(status.label(), "Offline");
    assert_eq!(status.format_last_sync(folio_core::now_millis()), "Never");

    r.set_online(true);
    r.drain().await.unwrap();
    let status = r.status();
    assert_eq!(status.pending, 0);
    assert_eq!(status.format_last_sync(folio_core::now_millis()), "Just now");
}

#[tokio::test]
async fn queue_survives_restart() {
    let dir = TestDir::new();
    let id = {
        let (store, queue) = dir.open();
        let r = Reconciler::new(SyncConfig::default(), MemoryGateway::new(), store, queue);
        offline_signed_in(&r);
        r.create("CV").await.unwrap().id
    };

    let (store, queue) = dir.open();
    let r = Reconciler::new(SyncConfig::default(), MemoryGateway::new(), store, queue);
    assert_eq!(r.queue().len(), 1);
    r.set_presence(Presence::signed_in(alice()));
    r.drain().await.unwrap();
    assert!(r.gateway().stored(&id).is_some());
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn stored_resume_survives_restart(resume in resume_strategy()) {
        let dir = TestDir::new();
        let saved = dir.store().put(resume.clone()).unwrap();

        let reloaded = dir.store().get(&resume.id).unwrap();
        prop_assert_eq!(&reloaded, &saved);
        prop_assert_eq!(reloaded.content, resume.content);
        prop_assert_eq!(reloaded.formatting, resume.formatting);
        prop_assert_eq!(reloaded.title, resume.title);
        prop_assert_eq!(reloaded.created_at, resume.created_at);
    }
}
