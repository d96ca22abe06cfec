// File: snapshotter/src/services/lifecycle_service.rs
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::Settings;
use crate::errors::{SnapshotterError, ValidationError};
use crate::gateway::CloudGateway;
use crate::snapshot::{CrossRegionReplicator, ExpirationPurger, SnapshotCreator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationPlan {
    pub selector_tag: String,
    pub purge_after_hours: u64,
    pub copy_to: Option<String>,
}

/// What one invocation does: an optional creation pass, then an optional purge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub creation: Option<CreationPlan>,
    pub purge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub copied: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} copied={} deleted={} failed={}",
            self.created, self.copied, self.deleted, self.failed
        )
    }
}

impl RunSummary {
    /// `Ok` only when nothing failed and the run was not interrupted.
    pub fn into_result(self) -> Result<RunSummary, SnapshotterError> {
        if self.cancelled {
            return Err(SnapshotterError::Cancelled {
                summary: self.to_string(),
            });
        }
        if self.failed > 0 {
            return Err(SnapshotterError::PartialFailure {
                failed: self.failed,
                summary: self.to_string(),
            });
        }
        Ok(self)
    }
}

pub struct LifecycleService {
    source: Arc<dyn CloudGateway>,
    destination: Option<Arc<dyn CloudGateway>>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    cancel: CancellationToken,
}

impl LifecycleService {
    pub fn new(
        source: Arc<dyn CloudGateway>,
        destination: Option<Arc<dyn CloudGateway>>,
        clock: Arc<dyn Clock>,
        settings: Settings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            destination,
            clock,
            settings,
            cancel,
        }
    }

    /// Runs the plan. Item-level failures are folded into the summary; only a
    /// plan that cannot be executed at all is returned as an error.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunSummary, SnapshotterError> {
        let mut summary = RunSummary::default();

        if let Some(creation) = &plan.creation {
            let replicator = self.build_replicator(creation)?;
            let creator = SnapshotCreator::new(
                self.source.clone(),
                self.clock.clone(),
                replicator,
                self.cancel.clone(),
            );

            match creator
                .create(&creation.selector_tag, creation.purge_after_hours)
                .await
            {
                Ok(report) => {
                    summary.created += report.created;
                    summary.copied += report.copied;
                    summary.failed += report.failed;
                    summary.cancelled |= report.cancelled;
                }
                Err(e) => {
                    error!("Snapshot creation pass failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        if plan.purge && !self.cancel.is_cancelled() {
            let purger =
                ExpirationPurger::new(self.source.clone(), self.clock.clone(), self.cancel.clone());

            match purger.purge(self.settings.throttle()).await {
                Ok(report) => {
                    summary.deleted += report.deleted;
                    summary.skipped += report.skipped;
                    summary.failed += report.failed;
                    summary.cancelled |= report.cancelled;
                }
                Err(e) => {
                    error!("Purge pass failed: {}", e);
                    summary.failed += 1;
                }
            }
        } else if plan.purge {
            summary.cancelled = true;
        }

        info!("{}", summary);
        Ok(summary)
    }

    fn build_replicator(
        &self,
        creation: &CreationPlan,
    ) -> Result<Option<CrossRegionReplicator>, ValidationError> {
        let Some(copy_to) = &creation.copy_to else {
            return Ok(None);
        };

        let destination = self
            .destination
            .as_ref()
            .filter(|gateway| gateway.region() == copy_to.as_str())
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "copyTo".to_string(),
                reason: format!("no gateway configured for region {}", copy_to),
            })?;

        Ok(Some(CrossRegionReplicator::new(
            self.source.clone(),
            destination.clone(),
            self.settings.poll_interval(),
            self.settings.max_poll_attempts,
            self.cancel.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_format() {
        let summary = RunSummary {
            created: 3,
            copied: 2,
            deleted: 5,
            skipped: 7,
            failed: 1,
            cancelled: false,
        };
        assert_eq!(summary.to_string(), "created=3 copied=2 deleted=5 failed=1");
    }

    #[test]
    fn test_summary_into_result() {
        assert!(RunSummary::default().into_result().is_ok());

        let failed = RunSummary {
            failed: 2,
            ..RunSummary::default()
        };
        assert!(matches!(
            failed.into_result(),
            Err(SnapshotterError::PartialFailure { failed: 2, .. })
        ));

        let cancelled = RunSummary {
            cancelled: true,
            ..RunSummary::default()
        };
        assert!(matches!(
            cancelled.into_result(),
            Err(SnapshotterError::Cancelled { .. })
        ));
    }
}
