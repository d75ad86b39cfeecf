mod common;

use std::sync::atomic::Ordering;

use kameo::actor::Spawn;
use serde_json::json;

use auditd_core::status::{INSTALLING, INVALID_CONFIG};
use auditd_core::*;
use common::*;

#[tokio::test]
async fn test_operator_actor_handles_events_in_order() {
    let harness = Harness::new();
    let actor_ref = OperatorActor::spawn(OperatorActorArgs {
        reconciler: harness.reconciler(),
    });

    let snapshot = actor_ref.ask(GetStatus).await.unwrap();
    assert_eq!(snapshot.status, None);
    assert_eq!(snapshot.events_handled, 0);

    let outcome = actor_ref
        .ask(Dispatch::new(LifecycleEvent::Install, RawOptions::new()))
        .await
        .unwrap();
    assert_eq!(outcome.status, Some(UnitStatus::maintenance(INSTALLING)));

    let outcome = actor_ref
        .ask(Dispatch::new(
            LifecycleEvent::ConfigChanged,
            options(&[("num_logs", json!(5))]),
        ))
        .await
        .unwrap();
    assert_eq!(outcome.status, Some(UnitStatus::Active));
    assert!(outcome.report.unwrap().config_written);

    let snapshot = actor_ref.ask(GetStatus).await.unwrap();
    assert_eq!(snapshot.status, Some(UnitStatus::Active));
    assert_eq!(snapshot.last_event, Some(LifecycleEvent::ConfigChanged));
    assert_eq!(snapshot.events_handled, 2);
    assert!(snapshot.last_handled.is_some());

    actor_ref.stop_gracefully().await.unwrap();
}

#[tokio::test]
async fn test_operator_actor_keeps_blocked_status() {
    let harness = Harness::new();
    let actor_ref = OperatorActor::spawn(OperatorActorArgs {
        reconciler: harness.reconciler(),
    });

    actor_ref
        .ask(Dispatch::new(
            LifecycleEvent::UpdateStatus,
            options(&[("num_logs", json!(-1))]),
        ))
        .await
        .unwrap();

    let snapshot = actor_ref.ask(GetStatus).await.unwrap();
    assert_eq!(snapshot.status, Some(UnitStatus::blocked(INVALID_CONFIG)));

    actor_ref.stop_gracefully().await.unwrap();
}

#[tokio::test]
async fn test_operator_actor_returns_fatal_error() {
    let harness = Harness::new();
    harness.probe.set("lxc");
    let actor_ref = OperatorActor::spawn(OperatorActorArgs {
        reconciler: harness.reconciler(),
    });

    let result = actor_ref
        .ask(Dispatch::new(LifecycleEvent::Install, RawOptions::new()))
        .await;
    assert!(result.is_err());
    assert_eq!(harness.packages.adds.load(Ordering::SeqCst), 0);

    // A failed event is counted but leaves no status behind
    let snapshot = actor_ref.ask(GetStatus).await.unwrap();
    assert_eq!(snapshot.status, None);
    assert_eq!(snapshot.events_handled, 1);

    actor_ref.stop_gracefully().await.unwrap();
}

#[tokio::test]
async fn test_failed_install_keeps_reported_maintenance() {
    let harness = Harness::new();
    let actor_ref = OperatorActor::spawn(OperatorActorArgs {
        reconciler: harness.reconciler(),
    });

    actor_ref
        .ask(Dispatch::new(LifecycleEvent::UpdateStatus, RawOptions::new()))
        .await
        .unwrap();

    harness.packages.fail.store(true, Ordering::SeqCst);
    let result = actor_ref
        .ask(Dispatch::new(LifecycleEvent::Install, RawOptions::new()))
        .await;
    assert!(result.is_err());

    // The snapshot agrees with what the reporter last saw
    let snapshot = actor_ref.ask(GetStatus).await.unwrap();
    assert_eq!(snapshot.status, Some(UnitStatus::maintenance(INSTALLING)));
    assert_eq!(snapshot.status, harness.reporter.last());

    actor_ref.stop_gracefully().await.unwrap();
}
