//! Builders for in-memory gateways and the services that use them

use std::sync::Arc;
use std::time::Duration;

use snapshotter::gateway::CloudGateway;
use snapshotter::snapshot::{CrossRegionReplicator, ExpirationPurger, SnapshotCreator};
use snapshotter::{FixedClock, InMemoryGateway, LifecycleService, Settings};
use tokio_util::sync::CancellationToken;

pub const SOURCE_REGION: &str = "us-east-1";
pub const DESTINATION_REGION: &str = "eu-west-1";

/// Polls every millisecond, gives up after `max_attempts` re-fetches.
pub fn fast_settings(max_attempts: u32, throttle_ms: u64) -> Settings {
    Settings {
        poll_interval_ms: 1,
        max_poll_attempts: max_attempts,
        throttle_ms,
        ..Settings::default()
    }
}

pub fn source_gateway() -> Arc<InMemoryGateway> {
    Arc::new(InMemoryGateway::new(SOURCE_REGION))
}

pub fn destination_gateway() -> Arc<InMemoryGateway> {
    Arc::new(InMemoryGateway::new(DESTINATION_REGION))
}

pub fn replicator(
    source: &Arc<InMemoryGateway>,
    destination: &Arc<InMemoryGateway>,
    max_attempts: u32,
    cancel: CancellationToken,
) -> CrossRegionReplicator {
    CrossRegionReplicator::new(
        source.clone(),
        destination.clone(),
        Duration::from_millis(1),
        max_attempts,
        cancel,
    )
}

pub fn creator(
    source: &Arc<InMemoryGateway>,
    now: i64,
    replicator: Option<CrossRegionReplicator>,
) -> SnapshotCreator {
    cancellable_creator(source, now, replicator, CancellationToken::new())
}

pub fn cancellable_creator(
    source: &Arc<InMemoryGateway>,
    now: i64,
    replicator: Option<CrossRegionReplicator>,
    cancel: CancellationToken,
) -> SnapshotCreator {
    SnapshotCreator::new(source.clone(), Arc::new(FixedClock(now)), replicator, cancel)
}

pub fn purger(gateway: &Arc<InMemoryGateway>, now: i64) -> ExpirationPurger {
    cancellable_purger(gateway, now, CancellationToken::new())
}

pub fn cancellable_purger(
    gateway: &Arc<InMemoryGateway>,
    now: i64,
    cancel: CancellationToken,
) -> ExpirationPurger {
    ExpirationPurger::new(gateway.clone(), Arc::new(FixedClock(now)), cancel)
}

pub fn lifecycle_service(
    source: &Arc<InMemoryGateway>,
    destination: Option<&Arc<InMemoryGateway>>,
    now: i64,
    settings: Settings,
) -> LifecycleService {
    cancellable_lifecycle_service(source, destination, now, settings, CancellationToken::new())
}

pub fn cancellable_lifecycle_service(
    source: &Arc<InMemoryGateway>,
    destination: Option<&Arc<InMemoryGateway>>,
    now: i64,
    settings: Settings,
    cancel: CancellationToken,
) -> LifecycleService {
    LifecycleService::new(
        source.clone(),
        destination.map(|d| d.clone() as Arc<dyn CloudGateway>),
        Arc::new(FixedClock(now)),
        settings,
        cancel,
    )
}
