//! In-memory gateway
//!
//! Keeps volumes and snapshots of one region in process and records every call
//! made against it. Snapshot completion is scripted: a new snapshot reports
//! `pending` for a configurable number of reads, then settles on its final
//! state. Individual calls can be made to fail to exercise per-item error
//! handling.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = InMemoryGateway::new("us-east-1").with_pending_reads(2);
//! gateway.add_volume("vol-1", vec![Tag::new("nightly", "true")]).await;
//! gateway.fail_on(GatewayOperation::CreateTags, "vol-1").await;
//! ```

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{CloudGateway, Snapshot, SnapshotState, Volume};
use crate::errors::GatewayError;
use crate::tags::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    ListVolumes,
    ListSnapshots,
    GetSnapshot,
    CreateSnapshot,
    CopySnapshot,
    DeleteSnapshot,
    CreateTags,
}

impl GatewayOperation {
    fn name(&self) -> &'static str {
        match self {
            GatewayOperation::ListVolumes => "DescribeVolumes",
            GatewayOperation::ListSnapshots => "DescribeSnapshots",
            GatewayOperation::GetSnapshot => "DescribeSnapshots",
            GatewayOperation::CreateSnapshot => "CreateSnapshot",
            GatewayOperation::CopySnapshot => "CopySnapshot",
            GatewayOperation::DeleteSnapshot => "DeleteSnapshot",
            GatewayOperation::CreateTags => "CreateTags",
        }
    }
}

/// A call as observed by the in-memory gateway, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListVolumes {
        tag_key: String,
    },
    ListSnapshots {
        tag_key: String,
    },
    GetSnapshot {
        snapshot_id: String,
    },
    CreateSnapshot {
        volume_id: String,
        description: String,
    },
    CopySnapshot {
        snapshot_id: String,
        source_region: String,
        destination_region: String,
        description: String,
    },
    DeleteSnapshot {
        snapshot_id: String,
    },
    CreateTags {
        resource_ids: Vec<String>,
        tags: Vec<Tag>,
    },
}

/// How a snapshot created from a given volume settles.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Settles(SnapshotState),
    StaysPending,
}

#[derive(Debug, Default)]
struct State {
    volumes: Vec<Volume>,
    snapshots: Vec<Snapshot>,
    // snapshot id -> remaining reads that still report pending
    pending_reads: HashMap<String, u32>,
    // snapshot id -> final state once pending reads run out
    outcomes: HashMap<String, Outcome>,
    // volume id -> outcome for snapshots created from it
    volume_outcomes: HashMap<String, Outcome>,
    failures: HashSet<(GatewayOperation, String)>,
    calls: Vec<GatewayCall>,
}

pub struct InMemoryGateway {
    region: String,
    default_pending_reads: u32,
    state: RwLock<State>,
}

impl InMemoryGateway {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            default_pending_reads: 0,
            state: RwLock::new(State::default()),
        }
    }

    /// Number of reads a newly created snapshot reports `pending` before settling.
    pub fn with_pending_reads(mut self, reads: u32) -> Self {
        self.default_pending_reads = reads;
        self
    }

    pub async fn add_volume(&self, volume_id: &str, tags: Vec<Tag>) {
        let mut state = self.state.write().await;
        state.volumes.push(Volume {
            id: volume_id.to_string(),
            tags,
        });
    }

    /// Seeds an existing snapshot, already settled in `state`.
    pub async fn add_snapshot(&self, snapshot_id: &str, state: SnapshotState, tags: Vec<Tag>) {
        let mut guard = self.state.write().await;
        guard.snapshots.push(Snapshot {
            id: snapshot_id.to_string(),
            volume_id: None,
            region: self.region.clone(),
            state,
            description: None,
            tags,
        });
    }

    /// Snapshots of `volume_id` never leave `pending`.
    pub async fn hold_pending(&self, volume_id: &str) {
        let mut state = self.state.write().await;
        state
            .volume_outcomes
            .insert(volume_id.to_string(), Outcome::StaysPending);
    }

    /// Snapshots of `volume_id` settle on `final_state` instead of `completed`.
    pub async fn settle_as(&self, volume_id: &str, final_state: SnapshotState) {
        let mut state = self.state.write().await;
        state
            .volume_outcomes
            .insert(volume_id.to_string(), Outcome::Settles(final_state));
    }

    /// Makes `operation` fail whenever it targets `resource` (volume id,
    /// snapshot id, or tag key for listings). `CreateTags` also fails for
    /// snapshots whose source volume is `resource`.
    pub async fn fail_on(&self, operation: GatewayOperation, resource: &str) {
        let mut state = self.state.write().await;
        state.failures.insert((operation, resource.to_string()));
    }

    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn snapshots(&self) -> Vec<Snapshot> {
        self.state.read().await.snapshots.clone()
    }

    pub async fn snapshot(&self, snapshot_id: &str) -> Option<Snapshot> {
        self.state
            .read()
            .await
            .snapshots
            .iter()
            .find(|s| s.id == snapshot_id)
            .cloned()
    }

    fn check_failure(
        state: &State,
        operation: GatewayOperation,
        resource: &str,
    ) -> Result<(), GatewayError> {
        if state.failures.contains(&(operation, resource.to_string())) {
            return Err(GatewayError::request_failed(
                operation.name(),
                resource,
                "injected failure",
            ));
        }
        Ok(())
    }

    fn new_snapshot_id() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("snap-{}", &id[..17])
    }

    fn insert_pending(
        &self,
        state: &mut State,
        volume_id: Option<&str>,
        description: &str,
    ) -> Snapshot {
        let outcome = volume_id
            .and_then(|v| state.volume_outcomes.get(v).cloned())
            .unwrap_or(Outcome::Settles(SnapshotState::Completed));

        let snapshot = Snapshot {
            id: Self::new_snapshot_id(),
            volume_id: volume_id.map(str::to_string),
            region: self.region.clone(),
            state: SnapshotState::Pending,
            description: Some(description.to_string()),
            tags: Vec::new(),
        };
        state
            .pending_reads
            .insert(snapshot.id.clone(), self.default_pending_reads);
        state.outcomes.insert(snapshot.id.clone(), outcome);
        state.snapshots.push(snapshot.clone());
        snapshot
    }
}

#[async_trait]
impl CloudGateway for InMemoryGateway {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_volumes(&self, tag_key: &str) -> Result<Vec<Volume>, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::ListVolumes {
            tag_key: tag_key.to_string(),
        });
        Self::check_failure(&state, GatewayOperation::ListVolumes, tag_key)?;

        Ok(state
            .volumes
            .iter()
            .filter(|v| v.tags.iter().any(|t| t.key == tag_key))
            .cloned()
            .collect())
    }

    async fn list_snapshots(&self, tag_key: &str) -> Result<Vec<Snapshot>, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::ListSnapshots {
            tag_key: tag_key.to_string(),
        });
        Self::check_failure(&state, GatewayOperation::ListSnapshots, tag_key)?;

        Ok(state
            .snapshots
            .iter()
            .filter(|s| s.tags.iter().any(|t| t.key == tag_key))
            .cloned()
            .collect())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot, GatewayError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.calls.push(GatewayCall::GetSnapshot {
            snapshot_id: snapshot_id.to_string(),
        });
        Self::check_failure(state, GatewayOperation::GetSnapshot, snapshot_id)?;

        let snapshot = state
            .snapshots
            .iter_mut()
            .find(|s| s.id == snapshot_id)
            .ok_or_else(|| GatewayError::NotFound {
                resource: snapshot_id.to_string(),
            })?;

        if snapshot.state.is_pending() {
            match state.pending_reads.get_mut(snapshot_id) {
                Some(remaining) if *remaining > 0 => *remaining -= 1,
                _ => {
                    if let Some(Outcome::Settles(final_state)) = state.outcomes.get(snapshot_id) {
                        debug!(snapshot_id, state = %final_state, "in-memory snapshot settled");
                        snapshot.state = final_state.clone();
                    }
                }
            }
        }

        Ok(snapshot.clone())
    }

    async fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<Snapshot, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::CreateSnapshot {
            volume_id: volume_id.to_string(),
            description: description.to_string(),
        });
        Self::check_failure(&state, GatewayOperation::CreateSnapshot, volume_id)?;

        if !state.volumes.iter().any(|v| v.id == volume_id) {
            return Err(GatewayError::NotFound {
                resource: volume_id.to_string(),
            });
        }

        Ok(self.insert_pending(&mut state, Some(volume_id), description))
    }

    async fn copy_snapshot(
        &self,
        snapshot_id: &str,
        source_region: &str,
        destination_region: &str,
        description: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::CopySnapshot {
            snapshot_id: snapshot_id.to_string(),
            source_region: source_region.to_string(),
            destination_region: destination_region.to_string(),
            description: description.to_string(),
        });
        Self::check_failure(&state, GatewayOperation::CopySnapshot, snapshot_id)?;

        if destination_region != self.region {
            return Err(GatewayError::request_failed(
                GatewayOperation::CopySnapshot.name(),
                snapshot_id,
                format!(
                    "destination {} does not match gateway region {}",
                    destination_region, self.region
                ),
            ));
        }

        Ok(self.insert_pending(&mut state, None, description).id)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::DeleteSnapshot {
            snapshot_id: snapshot_id.to_string(),
        });
        Self::check_failure(&state, GatewayOperation::DeleteSnapshot, snapshot_id)?;

        let before = state.snapshots.len();
        state.snapshots.retain(|s| s.id != snapshot_id);
        if state.snapshots.len() == before {
            return Err(GatewayError::NotFound {
                resource: snapshot_id.to_string(),
            });
        }
        state.pending_reads.remove(snapshot_id);
        state.outcomes.remove(snapshot_id);
        Ok(())
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::CreateTags {
            resource_ids: resource_ids.to_vec(),
            tags: tags.to_vec(),
        });
        for resource_id in resource_ids {
            Self::check_failure(&state, GatewayOperation::CreateTags, resource_id)?;
            // Tagging a snapshot can also be failed through its source volume
            let volume_id = state
                .snapshots
                .iter()
                .find(|s| &s.id == resource_id)
                .and_then(|s| s.volume_id.as_deref());
            if let Some(volume_id) = volume_id {
                Self::check_failure(&state, GatewayOperation::CreateTags, volume_id)?;
            }
        }

        for resource_id in resource_ids {
            let snapshot = state
                .snapshots
                .iter_mut()
                .find(|s| &s.id == resource_id)
                .ok_or_else(|| GatewayError::NotFound {
                    resource: resource_id.clone(),
                })?;

            // Same key overwrites, new keys append
            for tag in tags {
                match snapshot.tags.iter_mut().find(|t| t.key == tag.key) {
                    Some(existing) => existing.value = tag.value.clone(),
                    None => snapshot.tags.push(tag.clone()),
                }
            }
        }
        Ok(())
    }
}
