//! Integration tests for the expiration purge pass
//!
//! These tests verify the deletion rule, the fail-safe handling of missing or
//! malformed tags, idempotency, and the throttle between deletes.

mod common;

use std::time::{Duration, Instant};

use common::fixtures::*;
use snapshotter::gateway::{GatewayCall, GatewayOperation};
use snapshotter::SnapshotState;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_expired_snapshot_is_deleted() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("s-1", SnapshotState::Completed, purgeable(100))
        .await;

    let report = purger(&gateway, 200).purge(Duration::ZERO).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.deleted_ids, vec!["s-1".to_string()]);
    assert!(gateway.snapshot("s-1").await.is_none());
}

#[tokio::test]
async fn test_unexpired_snapshot_is_kept() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("s-1", SnapshotState::Completed, purgeable(100))
        .await;

    let report = purger(&gateway, 50).purge(Duration::ZERO).await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.skipped, 1);
    assert!(gateway.snapshot("s-1").await.is_some());
}

#[tokio::test]
async fn test_missing_or_malformed_tags_never_delete() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("no-expiry", SnapshotState::Completed, tags(&[("PurgeAllow", "true")]))
        .await;
    gateway
        .add_snapshot(
            "bad-expiry",
            SnapshotState::Completed,
            tags(&[("PurgeAllow", "true"), ("PurgeAfterFE", "tomorrow")]),
        )
        .await;
    gateway
        .add_snapshot(
            "not-allowed",
            SnapshotState::Completed,
            tags(&[("PurgeAllow", "false"), ("PurgeAfterFE", "1")]),
        )
        .await;
    gateway
        .add_snapshot(
            "wrong-case",
            SnapshotState::Completed,
            tags(&[("PurgeAllow", "True"), ("PurgeAfterFE", "1")]),
        )
        .await;
    gateway
        .add_snapshot("untagged", SnapshotState::Completed, vec![])
        .await;

    let report = purger(&gateway, NOW).purge(Duration::ZERO).await.unwrap();

    assert_eq!(report.deleted, 0);
    // "untagged" is not even listed
    assert_eq!(report.skipped, 4);
    assert_eq!(gateway.snapshots().await.len(), 5);
}

#[tokio::test]
async fn test_purge_twice_is_idempotent() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("s-old", SnapshotState::Completed, purgeable(NOW - 10))
        .await;
    gateway
        .add_snapshot("s-new", SnapshotState::Completed, purgeable(NOW + 3600))
        .await;

    let first = purger(&gateway, NOW).purge(Duration::ZERO).await.unwrap();
    let second = purger(&gateway, NOW).purge(Duration::ZERO).await.unwrap();

    assert_eq!(first.deleted, 1);
    assert_eq!(second.deleted, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn test_deletes_are_throttled() {
    let gateway = source_gateway();
    for i in 0..4 {
        gateway
            .add_snapshot(&format!("s-{}", i), SnapshotState::Completed, purgeable(100))
            .await;
    }

    let throttle = Duration::from_millis(30);
    let start = Instant::now();
    let report = purger(&gateway, 200).purge(throttle).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.deleted, 4);
    assert!(
        elapsed >= throttle * 3,
        "4 deletes should take at least 3 throttle periods, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_delete_failure_is_counted_and_throttle_still_applies() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("s-1", SnapshotState::Completed, purgeable(100))
        .await;
    gateway
        .add_snapshot("s-2", SnapshotState::Completed, purgeable(100))
        .await;
    gateway
        .add_snapshot("s-3", SnapshotState::Completed, purgeable(100))
        .await;
    gateway.fail_on(GatewayOperation::DeleteSnapshot, "s-2").await;

    let throttle = Duration::from_millis(25);
    let start = Instant::now();
    let report = purger(&gateway, 200).purge(throttle).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.deleted_ids, vec!["s-1".to_string(), "s-3".to_string()]);
    assert!(gateway.snapshot("s-2").await.is_some());
    assert!(elapsed >= throttle * 2, "took {:?}", elapsed);
}

#[tokio::test]
async fn test_deletes_happen_in_listing_order() {
    let gateway = source_gateway();
    for id in ["s-c", "s-a", "s-b"] {
        gateway
            .add_snapshot(id, SnapshotState::Completed, purgeable(100))
            .await;
    }

    purger(&gateway, 200).purge(Duration::ZERO).await.unwrap();

    let deleted: Vec<_> = gateway
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::DeleteSnapshot { snapshot_id } => Some(snapshot_id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec!["s-c", "s-a", "s-b"]);
}

#[tokio::test]
async fn test_listing_failure_is_returned() {
    let gateway = source_gateway();
    gateway.fail_on(GatewayOperation::ListSnapshots, "PurgeAllow").await;

    assert!(purger(&gateway, 200).purge(Duration::ZERO).await.is_err());
}

#[tokio::test]
async fn test_cancel_during_throttle_stops_the_pass() {
    let gateway = source_gateway();
    for id in ["s-1", "s-2", "s-3"] {
        gateway
            .add_snapshot(id, SnapshotState::Completed, purgeable(100))
            .await;
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    // The throttle is far longer than the test timeout; only cancellation ends it
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        cancellable_purger(&gateway, 200, cancel).purge(Duration::from_secs(60)),
    )
    .await
    .expect("cancellation should interrupt the throttle")
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.deleted_ids, vec!["s-1".to_string()]);
    assert!(gateway.snapshot("s-2").await.is_some());
    assert!(gateway.snapshot("s-3").await.is_some());
}

#[tokio::test]
async fn test_cancelled_before_start_deletes_nothing() {
    let gateway = source_gateway();
    gateway
        .add_snapshot("s-1", SnapshotState::Completed, purgeable(100))
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = cancellable_purger(&gateway, 200, cancel)
        .purge(Duration::ZERO)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.deleted, 0);
    assert!(gateway
        .calls()
        .await
        .iter()
        .all(|c| !matches!(c, GatewayCall::DeleteSnapshot { .. })));
}
