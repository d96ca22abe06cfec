//! EC2 gateway built on `aws-sdk-ec2`
//!
//! Every gateway owns its own client configured with an explicit region and
//! static credentials. Nothing is read from shared SDK state.

use async_trait::async_trait;
use aws_sdk_ec2::config::{BehaviorVersion, Credentials as AwsCredentials, Region};
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{
    Filter, Snapshot as Ec2Snapshot, SnapshotState as Ec2SnapshotState, Tag as Ec2Tag,
};
use aws_sdk_ec2::Client;
use tracing::debug;

use super::{CloudGateway, Snapshot, SnapshotState, Volume};
use crate::config::Credentials;
use crate::errors::GatewayError;
use crate::tags::Tag;

const PROVIDER_NAME: &str = "snapshotter-environment";

pub struct Ec2Gateway {
    client: Client,
    region: String,
    owner_filter: Option<String>,
}

impl Ec2Gateway {
    pub fn new(credentials: &Credentials, region: &str, owner_filter: Option<String>) -> Self {
        let aws_credentials = AwsCredentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            credentials.session_token.clone(),
            None,
            PROVIDER_NAME,
        );

        let config = aws_sdk_ec2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(aws_credentials)
            .build();

        debug!(region, "EC2 client configured");

        Self {
            client: Client::from_conf(config),
            region: region.to_string(),
            owner_filter,
        }
    }

    fn snapshot_from_ec2(&self, snapshot: &Ec2Snapshot) -> Option<Snapshot> {
        Some(Snapshot {
            id: snapshot.snapshot_id()?.to_string(),
            volume_id: snapshot.volume_id().map(str::to_string),
            region: self.region.clone(),
            state: snapshot
                .state()
                .map(state_from_ec2)
                .unwrap_or_else(|| SnapshotState::Other("unknown".to_string())),
            description: snapshot.description().map(str::to_string),
            tags: tags_from_ec2(snapshot.tags()),
        })
    }
}

fn tag_key_filter(tag_key: &str) -> Filter {
    Filter::builder().name("tag-key").values(tag_key).build()
}

fn tags_from_ec2(tags: &[Ec2Tag]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|tag| {
            Some(Tag::new(
                tag.key()?,
                tag.value().unwrap_or_default(),
            ))
        })
        .collect()
}

fn tags_to_ec2(tags: &[Tag]) -> Vec<Ec2Tag> {
    tags.iter()
        .map(|tag| Ec2Tag::builder().key(&tag.key).value(&tag.value).build())
        .collect()
}

fn state_from_ec2(state: &Ec2SnapshotState) -> SnapshotState {
    match state {
        Ec2SnapshotState::Pending => SnapshotState::Pending,
        Ec2SnapshotState::Completed => SnapshotState::Completed,
        Ec2SnapshotState::Error => SnapshotState::Error,
        other => SnapshotState::Other(other.as_str().to_string()),
    }
}

#[async_trait]
impl CloudGateway for Ec2Gateway {
    fn region(&self) -> &str {
        &self.region
    }

    async fn list_volumes(&self, tag_key: &str) -> Result<Vec<Volume>, GatewayError> {
        let mut volumes = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_volumes()
                .filters(tag_key_filter(tag_key))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| {
                    GatewayError::request_failed("DescribeVolumes", tag_key, DisplayErrorContext(&e))
                })?;

            for volume in output.volumes() {
                if let Some(id) = volume.volume_id() {
                    volumes.push(Volume {
                        id: id.to_string(),
                        tags: tags_from_ec2(volume.tags()),
                    });
                }
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(volumes)
    }

    async fn list_snapshots(&self, tag_key: &str) -> Result<Vec<Snapshot>, GatewayError> {
        let mut snapshots = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .describe_snapshots()
                .filters(tag_key_filter(tag_key))
                .set_next_token(next_token.take());
            if let Some(owner) = &self.owner_filter {
                request = request.owner_ids(owner);
            }

            let output = request.send().await.map_err(|e| {
                GatewayError::request_failed("DescribeSnapshots", tag_key, DisplayErrorContext(&e))
            })?;

            snapshots.extend(
                output
                    .snapshots()
                    .iter()
                    .filter_map(|s| self.snapshot_from_ec2(s)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(snapshots)
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot, GatewayError> {
        let output = self
            .client
            .describe_snapshots()
            .snapshot_ids(snapshot_id)
            .send()
            .await
            .map_err(|e| {
                GatewayError::request_failed("DescribeSnapshots", snapshot_id, DisplayErrorContext(&e))
            })?;

        output
            .snapshots()
            .first()
            .and_then(|s| self.snapshot_from_ec2(s))
            .ok_or_else(|| GatewayError::NotFound {
                resource: snapshot_id.to_string(),
            })
    }

    async fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<Snapshot, GatewayError> {
        let output = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(description)
            .send()
            .await
            .map_err(|e| {
                GatewayError::request_failed("CreateSnapshot", volume_id, DisplayErrorContext(&e))
            })?;

        let id = output.snapshot_id().ok_or_else(|| {
            GatewayError::invalid_response("CreateSnapshot", "response carried no snapshot id")
        })?;

        Ok(Snapshot {
            id: id.to_string(),
            volume_id: Some(volume_id.to_string()),
            region: self.region.clone(),
            state: output
                .state()
                .map(state_from_ec2)
                .unwrap_or(SnapshotState::Pending),
            description: Some(description.to_string()),
            tags: tags_from_ec2(output.tags()),
        })
    }

    async fn copy_snapshot(
        &self,
        snapshot_id: &str,
        source_region: &str,
        destination_region: &str,
        description: &str,
    ) -> Result<String, GatewayError> {
        let output = self
            .client
            .copy_snapshot()
            .source_snapshot_id(snapshot_id)
            .source_region(source_region)
            .destination_region(destination_region)
            .description(description)
            .send()
            .await
            .map_err(|e| {
                GatewayError::request_failed("CopySnapshot", snapshot_id, DisplayErrorContext(&e))
            })?;

        output
            .snapshot_id()
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::invalid_response("CopySnapshot", "response carried no snapshot id")
            })
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), GatewayError> {
        self.client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|e| {
                GatewayError::request_failed("DeleteSnapshot", snapshot_id, DisplayErrorContext(&e))
            })?;
        Ok(())
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), GatewayError> {
        self.client
            .create_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .set_tags(Some(tags_to_ec2(tags)))
            .send()
            .await
            .map_err(|e| {
                GatewayError::request_failed(
                    "CreateTags",
                    resource_ids.join(","),
                    DisplayErrorContext(&e),
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_mapping() {
        assert_eq!(state_from_ec2(&Ec2SnapshotState::Pending), SnapshotState::Pending);
        assert_eq!(state_from_ec2(&Ec2SnapshotState::Completed), SnapshotState::Completed);
        assert_eq!(state_from_ec2(&Ec2SnapshotState::Error), SnapshotState::Error);
        assert_eq!(
            state_from_ec2(&Ec2SnapshotState::Recoverable),
            SnapshotState::Other("recoverable".to_string())
        );
    }

    #[test]
    fn test_tag_conversion_keeps_order_and_drops_keyless() {
        let ec2_tags = vec![
            Ec2Tag::builder().key("Name").value("db").build(),
            Ec2Tag::builder().value("orphan").build(),
            Ec2Tag::builder().key("PurgeAllow").value("true").build(),
        ];
        assert_eq!(
            tags_from_ec2(&ec2_tags),
            vec![Tag::new("Name", "db"), Tag::new("PurgeAllow", "true")]
        );

        let round = tags_to_ec2(&[Tag::new("PurgeAfterFE", "100")]);
        assert_eq!(round[0].key(), Some("PurgeAfterFE"));
        assert_eq!(round[0].value(), Some("100"));
    }
}
