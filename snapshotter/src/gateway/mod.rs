//! Cloud resource gateway
//!
//! The lifecycle logic only ever talks to the provider through
//! [`CloudGateway`]. Each gateway instance is bound to a single region and is
//! constructed from an explicit configuration, so a run that copies across
//! regions holds two gateways side by side.
//!
//! - [`Ec2Gateway`]: EC2 volumes and snapshots via `aws-sdk-ec2`
//! - [`InMemoryGateway`]: scriptable in-process double for tests

#[cfg(feature = "aws")]
pub mod ec2;
pub mod memory;

use std::fmt;

use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::tags::Tag;

#[cfg(feature = "aws")]
pub use ec2::Ec2Gateway;
pub use memory::{GatewayCall, GatewayOperation, InMemoryGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    /// Any provider state outside the three the lifecycle understands
    Other(String),
}

impl SnapshotState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SnapshotState::Pending)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SnapshotState::Pending => "pending",
            SnapshotState::Completed => "completed",
            SnapshotState::Error => "error",
            SnapshotState::Other(state) => state,
        }
    }
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: Option<String>,
    pub region: String,
    pub state: SnapshotState,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
}

/// Volume, snapshot and tag primitives consumed by the lifecycle.
#[async_trait]
pub trait CloudGateway: Send + Sync {
    /// Region every call of this gateway is made against.
    fn region(&self) -> &str;

    /// Volumes that carry `tag_key`, whatever its value.
    async fn list_volumes(&self, tag_key: &str) -> Result<Vec<Volume>, GatewayError>;

    /// Snapshots that carry `tag_key`, whatever its value.
    async fn list_snapshots(&self, tag_key: &str) -> Result<Vec<Snapshot>, GatewayError>;

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot, GatewayError>;

    async fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<Snapshot, GatewayError>;

    /// Copies `snapshot_id` from `source_region` into this gateway's region.
    /// Returns the id of the new snapshot.
    async fn copy_snapshot(
        &self,
        snapshot_id: &str,
        source_region: &str,
        destination_region: &str,
        description: &str,
    ) -> Result<String, GatewayError>;

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), GatewayError>;

    /// Applies all `tags` to all `resource_ids` in one call.
    async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), GatewayError>;
}
