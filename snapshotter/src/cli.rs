//! Command-line flags and their validation into a [`RunPlan`].

use std::path::PathBuf;

use clap::Parser;

use crate::errors::ValidationError;
use crate::services::{CreationPlan, RunPlan};
use crate::tags::hours_to_seconds;

/// Create, replicate and purge EBS snapshots driven by resource tags.
#[derive(Debug, Parser)]
#[command(name = "snapshotter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Create snapshots for any volumes whose tag of this name is "true".
    #[arg(short = 's', long = "snapshotTag")]
    pub snapshot_tag: Option<String>,

    /// Hours after which created snapshots may be purged (adds PurgeAllow/PurgeAfterFE).
    #[arg(short = 'k', long = "purgeAfter", default_value_t = 0)]
    pub purge_after: u64,

    /// Copy any snapshots created to this destination region.
    #[arg(short = 'c', long = "copyTo")]
    pub copy_to: Option<String>,

    /// Purge any expired snapshots.
    #[arg(short = 'p', long = "purge")]
    pub purge: bool,

    /// Delay in milliseconds between purge requests [default: 250].
    #[arg(short = 't', long = "throttle")]
    pub throttle: Option<u64>,

    /// Optional TOML file with polling and throttle settings.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn plan(&self) -> Result<RunPlan, ValidationError> {
        let snapshot_tag = match &self.snapshot_tag {
            Some(tag) if tag.trim().is_empty() => {
                return Err(ValidationError::InvalidValue {
                    field: "snapshotTag".to_string(),
                    reason: "tag name must not be empty".to_string(),
                });
            }
            other => other.clone(),
        };

        let copy_to = match &self.copy_to {
            Some(region) if region.trim().is_empty() => {
                return Err(ValidationError::InvalidValue {
                    field: "copyTo".to_string(),
                    reason: "region must not be empty".to_string(),
                });
            }
            other => other.clone(),
        };

        if hours_to_seconds(self.purge_after).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "purgeAfter".to_string(),
                reason: format!("{} hours is too far in the future", self.purge_after),
            });
        }

        if snapshot_tag.is_none() {
            if self.purge_after > 0 {
                return Err(ValidationError::InvalidCombination {
                    reason: "--purgeAfter requires --snapshotTag".to_string(),
                });
            }
            if copy_to.is_some() {
                return Err(ValidationError::InvalidCombination {
                    reason: "--copyTo requires --snapshotTag".to_string(),
                });
            }
            if !self.purge {
                return Err(ValidationError::InvalidCombination {
                    reason: "nothing to do: pass --snapshotTag and/or --purge".to_string(),
                });
            }
        }

        Ok(RunPlan {
            creation: snapshot_tag.map(|selector_tag| CreationPlan {
                selector_tag,
                purge_after_hours: self.purge_after,
                copy_to,
            }),
            purge: self.purge,
        })
    }
}
