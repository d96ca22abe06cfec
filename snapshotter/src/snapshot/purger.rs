// File: snapshotter/src/snapshot/purger.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::constants::tags;
use crate::errors::GatewayError;
use crate::gateway::CloudGateway;
use crate::tags::{get_epoch_tag, get_tag_value, Tag};

/// Outcome of evaluating one snapshot's lifecycle tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeDecision {
    Delete { purge_after: i64 },
    /// `PurgeAllow` is absent or anything but `"true"`
    NotAllowed,
    /// `PurgeAfterFE` is absent or not an integer
    NoExpiry,
    NotExpired { purge_after: i64 },
}

/// Deletion requires `PurgeAllow == "true"` and a parseable `PurgeAfterFE`
/// strictly before `now_epoch`. Missing or malformed data never deletes.
pub fn evaluate(snapshot_tags: &[Tag], now_epoch: i64) -> PurgeDecision {
    if get_tag_value(snapshot_tags, tags::PURGE_ALLOW) != Some(tags::TRUE_VALUE) {
        return PurgeDecision::NotAllowed;
    }
    match get_epoch_tag(snapshot_tags, tags::PURGE_AFTER_FE) {
        None => PurgeDecision::NoExpiry,
        Some(purge_after) if now_epoch > purge_after => PurgeDecision::Delete { purge_after },
        Some(purge_after) => PurgeDecision::NotExpired { purge_after },
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurgeReport {
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub deleted_ids: Vec<String>,
}

/// Deletes expired snapshots one at a time, pausing between deletes.
pub struct ExpirationPurger {
    gateway: Arc<dyn CloudGateway>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl ExpirationPurger {
    pub fn new(
        gateway: Arc<dyn CloudGateway>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            clock,
            cancel,
        }
    }

    /// Runs one purge pass. Only a failure to list candidates is returned as an
    /// error; delete failures are counted and the pass moves on.
    pub async fn purge(&self, throttle: Duration) -> Result<PurgeReport, GatewayError> {
        info!(
            "Purging expired snapshots from region '{}' with tag '{}'...",
            self.gateway.region(),
            tags::PURGE_ALLOW
        );

        let candidates = self.gateway.list_snapshots(tags::PURGE_ALLOW).await?;
        let now_epoch = self.clock.now_epoch();
        let mut report = PurgeReport::default();
        let mut delete_attempted = false;

        for snapshot in &candidates {
            let purge_after = match evaluate(&snapshot.tags, now_epoch) {
                PurgeDecision::Delete { purge_after } => purge_after,
                decision => {
                    debug!(snapshot_id = %snapshot.id, ?decision, "Keeping snapshot");
                    report.skipped += 1;
                    continue;
                }
            };

            if delete_attempted {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        warn!("Purge cancelled before snapshot {}", snapshot.id);
                        report.cancelled = true;
                        break;
                    }
                    _ = sleep(throttle) => {}
                }
            } else if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            delete_attempted = true;

            match self.gateway.delete_snapshot(&snapshot.id).await {
                Ok(()) => {
                    report.deleted += 1;
                    report.deleted_ids.push(snapshot.id.clone());
                    info!(
                        snapshot_id = %snapshot.id,
                        purge_after,
                        "Deleted expired snapshot '{}'",
                        snapshot.id
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(snapshot_id = %snapshot.id, "Failed to delete expired snapshot '{}': {}", snapshot.id, e);
                }
            }
        }

        info!(
            "Purge finished: {} deleted, {} kept, {} failed",
            report.deleted, report.skipped, report.failed
        );
        Ok(report)
    }
}
