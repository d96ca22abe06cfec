// File: snapshotter/src/snapshot/creator.rs
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::replicator::CrossRegionReplicator;
use crate::clock::Clock;
use crate::errors::{GatewayError, ReplicationError};
use crate::gateway::{CloudGateway, Snapshot, Volume};
use crate::tags::{build_snapshot_tags, is_opted_in, resource_label, ExpirationPolicy, Tag};

#[derive(Debug, Clone)]
pub struct CreatedSnapshot {
    pub volume_id: String,
    pub snapshot_id: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub copy_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreationReport {
    pub created: usize,
    pub copied: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: bool,
    pub snapshots: Vec<CreatedSnapshot>,
}

/// Snapshots every volume opted in through the selector tag.
pub struct SnapshotCreator {
    gateway: Arc<dyn CloudGateway>,
    clock: Arc<dyn Clock>,
    replicator: Option<CrossRegionReplicator>,
    cancel: CancellationToken,
}

impl SnapshotCreator {
    pub fn new(
        gateway: Arc<dyn CloudGateway>,
        clock: Arc<dyn Clock>,
        replicator: Option<CrossRegionReplicator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            clock,
            replicator,
            cancel,
        }
    }

    /// Creates one snapshot per volume whose `selector_tag` is exactly `"true"`.
    ///
    /// Per-volume failures are logged and counted; only a failure to list the
    /// volumes at all is returned as an error.
    pub async fn create(
        &self,
        selector_tag: &str,
        purge_after_hours: u64,
    ) -> Result<CreationReport, GatewayError> {
        info!(
            "Creating snapshots for volumes from region '{}' with tag '{}'...",
            self.gateway.region(),
            selector_tag
        );

        let now_epoch = self.clock.now_epoch();
        let policy = ExpirationPolicy::from_hours(now_epoch, purge_after_hours);
        if let Some(purge_after) = policy.purge_after_epoch() {
            info!(
                "Allow created snapshots to be purged after {} hours ({})",
                purge_after_hours, purge_after
            );
        }

        let description = format!("{} - {}", selector_tag, now_epoch);
        let volumes = self.gateway.list_volumes(selector_tag).await?;
        let mut report = CreationReport::default();

        for volume in volumes.iter().filter(|v| is_opted_in(&v.tags, selector_tag)) {
            if self.cancel.is_cancelled() {
                warn!("Snapshot creation cancelled before volume {}", volume.id);
                report.cancelled = true;
                break;
            }

            let label = resource_label(&volume.id, &volume.tags);
            let tags = build_snapshot_tags(&volume.tags, &policy);

            let snapshot = match self.snapshot_volume(volume, &description, &tags).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!(volume_id = %volume.id, "Failed to snapshot volume '{}': {}", label, e);
                    report.failed += 1;
                    continue;
                }
            };

            report.created += 1;
            info!(
                snapshot_id = %snapshot.id,
                volume_id = %volume.id,
                "Created snapshot '{}' for volume '{}'",
                snapshot.id,
                label
            );

            let mut created = CreatedSnapshot {
                volume_id: volume.id.clone(),
                snapshot_id: snapshot.id.clone(),
                description: description.clone(),
                tags: tags.clone(),
                copy_id: None,
            };

            if let Some(replicator) = &self.replicator {
                match replicator.replicate(&snapshot, &tags).await {
                    Ok(copy_id) => {
                        report.copied += 1;
                        created.copy_id = Some(copy_id);
                    }
                    Err(e) => {
                        report.failed += 1;
                        if e.is_timeout() {
                            report.timed_out += 1;
                        }
                        error!(
                            snapshot_id = %snapshot.id,
                            "Could not copy snapshot '{}' for volume '{}' to region '{}': {}",
                            snapshot.id,
                            label,
                            replicator.destination_region(),
                            e
                        );
                        if matches!(e, ReplicationError::Cancelled { .. }) {
                            report.snapshots.push(created);
                            report.cancelled = true;
                            break;
                        }
                    }
                }
            }

            report.snapshots.push(created);
        }

        info!(
            "Snapshot creation finished: {} created, {} copied, {} failed",
            report.created, report.copied, report.failed
        );
        Ok(report)
    }

    /// Creates the snapshot, then applies the whole tag set in one call.
    #[instrument(skip(self, volume, tags), fields(volume_id = %volume.id))]
    async fn snapshot_volume(
        &self,
        volume: &Volume,
        description: &str,
        tags: &[Tag],
    ) -> Result<Snapshot, GatewayError> {
        let mut snapshot = self.gateway.create_snapshot(&volume.id, description).await?;

        if !tags.is_empty() {
            if let Err(e) = self
                .gateway
                .create_tags(std::slice::from_ref(&snapshot.id), tags)
                .await
            {
                warn!(
                    "Snapshot {} was created but its lifecycle tags were not applied",
                    snapshot.id
                );
                return Err(e);
            }
            snapshot.tags = tags.to_vec();
        }

        Ok(snapshot)
    }
}
