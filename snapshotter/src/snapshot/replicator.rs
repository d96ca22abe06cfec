// File: snapshotter/src/snapshot/replicator.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::errors::ReplicationError;
use crate::gateway::{CloudGateway, Snapshot, SnapshotState};
use crate::tags::Tag;

/// Waits for a source snapshot to settle, then copies it into the destination
/// region and mirrors its tags onto the copy.
pub struct CrossRegionReplicator {
    source: Arc<dyn CloudGateway>,
    destination: Arc<dyn CloudGateway>,
    poll_interval: Duration,
    max_attempts: u32,
    cancel: CancellationToken,
}

impl CrossRegionReplicator {
    pub fn new(
        source: Arc<dyn CloudGateway>,
        destination: Arc<dyn CloudGateway>,
        poll_interval: Duration,
        max_attempts: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            destination,
            poll_interval,
            max_attempts,
            cancel,
        }
    }

    pub fn destination_region(&self) -> &str {
        self.destination.region()
    }

    /// Replicates `snapshot` (as last observed) and returns the id of the copy.
    #[instrument(skip(self, snapshot, tags), fields(snapshot_id = %snapshot.id, destination = %self.destination.region()))]
    pub async fn replicate(
        &self,
        snapshot: &Snapshot,
        tags: &[Tag],
    ) -> Result<String, ReplicationError> {
        let settled = self.wait_for_completion(snapshot).await?;

        if settled.state != SnapshotState::Completed {
            return Err(ReplicationError::SourceNotCompleted {
                snapshot_id: settled.id,
                state: settled.state.to_string(),
            });
        }

        let source_region = self.source.region();
        let description = copy_description(snapshot.description.as_deref(), &snapshot.id, source_region);

        let copy_id = self
            .destination
            .copy_snapshot(
                &snapshot.id,
                source_region,
                self.destination.region(),
                &description,
            )
            .await?;

        if !tags.is_empty() {
            if let Err(e) = self
                .destination
                .create_tags(std::slice::from_ref(&copy_id), tags)
                .await
            {
                warn!(
                    "Copy {} of snapshot {} exists but could not be tagged: {}",
                    copy_id, snapshot.id, e
                );
                return Err(e.into());
            }
        }

        info!(
            snapshot_id = %snapshot.id,
            copy_id = %copy_id,
            "Copied snapshot {} to {} in region {}",
            snapshot.id,
            copy_id,
            self.destination.region()
        );
        Ok(copy_id)
    }

    /// Re-fetches the snapshot while it is pending, at most `max_attempts` times.
    async fn wait_for_completion(&self, snapshot: &Snapshot) -> Result<Snapshot, ReplicationError> {
        let mut current = snapshot.clone();
        let mut attempts = 0u32;

        if current.state.is_pending() {
            info!("Waiting for snapshot {} to complete...", current.id);
        }

        while current.state.is_pending() {
            if attempts >= self.max_attempts {
                warn!(
                    "Snapshot {} still pending after {} attempts, giving up on copy",
                    current.id, attempts
                );
                return Err(ReplicationError::Timeout {
                    snapshot_id: current.id,
                    attempts,
                });
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ReplicationError::Cancelled { snapshot_id: current.id });
                }
                _ = sleep(self.poll_interval) => {}
            }

            current = self.source.get_snapshot(&snapshot.id).await?;
            attempts += 1;
        }

        Ok(current)
    }
}

/// `"{description} [Copied {id} from {region}]"`
pub fn copy_description(description: Option<&str>, snapshot_id: &str, source_region: &str) -> String {
    match description {
        Some(description) if !description.is_empty() => {
            format!("{} [Copied {} from {}]", description, snapshot_id, source_region)
        }
        _ => format!("[Copied {} from {}]", snapshot_id, source_region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_description() {
        assert_eq!(
            copy_description(Some("nightly - 1700000000"), "snap-1", "us-east-1"),
            "nightly - 1700000000 [Copied snap-1 from us-east-1]"
        );
        assert_eq!(
            copy_description(None, "snap-1", "us-east-1"),
            "[Copied snap-1 from us-east-1]"
        );
        assert_eq!(
            copy_description(Some(""), "snap-1", "us-east-1"),
            "[Copied snap-1 from us-east-1]"
        );
    }
}
