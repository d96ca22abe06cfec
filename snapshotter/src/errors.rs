//! Custom error types for the snapshotter
//!
//! Provides structured error handling with context for the different failure
//! scenarios of a lifecycle run. Validation and configuration errors are fatal
//! at startup; gateway and replication errors are handled per item.

use thiserror::Error;

/// Main error type for the snapshotter
#[derive(Debug, Error)]
pub enum SnapshotterError {
    /// Invalid or missing flag combination
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote call failures
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Cross-region replication failures
    #[error("Replication error: {0}")]
    Replication(#[from] ReplicationError),

    /// One or more items failed while others succeeded
    #[error("{failed} item(s) failed ({summary})")]
    PartialFailure { failed: usize, summary: String },

    /// The run was interrupted before it finished
    #[error("Run cancelled ({summary})")]
    Cancelled { summary: String },
}

/// Flag and settings validation error variants
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Missing required value (flag or environment variable)
    #[error("Missing required value: {field}")]
    MissingRequired { field: String },

    /// A value is present but unusable
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Flags that only make sense together were not given together
    #[error("Invalid flag combination: {reason}")]
    InvalidCombination { reason: String },
}

/// Configuration file error variants
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to load config from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// Configuration parsing error
    #[error("Failed to parse config '{path}': {reason}")]
    ParseError { path: String, reason: String },
}

/// Remote call error variants
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The provider rejected the call or it never reached the provider
    #[error("{operation} failed for {resource}: {reason}")]
    RequestFailed {
        operation: String,
        resource: String,
        reason: String,
    },

    /// The requested resource does not exist
    #[error("Resource {resource} not found")]
    NotFound { resource: String },

    /// The provider answered without a field we need
    #[error("Invalid response to {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },
}

impl GatewayError {
    pub fn request_failed(
        operation: impl Into<String>,
        resource: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        GatewayError::RequestFailed {
            operation: operation.into(),
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_response(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::InvalidResponse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Cross-region replication error variants
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplicationError {
    /// The source snapshot reached a state other than completed
    #[error("Snapshot {snapshot_id} ended in state '{state}', not copying")]
    SourceNotCompleted { snapshot_id: String, state: String },

    /// The source snapshot was still pending after the last poll
    #[error("Snapshot {snapshot_id} still pending after {attempts} poll attempts")]
    Timeout { snapshot_id: String, attempts: u32 },

    /// Waiting was interrupted by cancellation
    #[error("Replication of snapshot {snapshot_id} cancelled")]
    Cancelled { snapshot_id: String },

    /// A remote call failed while polling, copying or tagging
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ReplicationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReplicationError::Timeout { .. })
    }
}

pub type Result<T, E = SnapshotterError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display_includes_resource() {
        let err = GatewayError::request_failed("DeleteSnapshot", "snap-1", "throttled");
        assert_eq!(err.to_string(), "DeleteSnapshot failed for snap-1: throttled");
    }

    #[test]
    fn test_replication_error_wraps_gateway_error() {
        let err: ReplicationError = GatewayError::NotFound {
            resource: "snap-9".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Resource snap-9 not found");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_validation_error_converts_to_main_error() {
        let err: SnapshotterError = ValidationError::MissingRequired {
            field: "AWS_DEFAULT_REGION".to_string(),
        }
        .into();
        assert!(matches!(err, SnapshotterError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required value: AWS_DEFAULT_REGION"
        );
    }
}
