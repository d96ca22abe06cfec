// File: snapshotter/src/config/mod.rs
pub mod env;
pub mod manager;

use serde::Deserialize;
use std::time::Duration;

use crate::constants::{polling, purge};
use crate::errors::ValidationError;

pub use env::{Credentials, Environment};
pub use manager::ConfigManager;

/// Tunables for a run. Every field has a default, so the TOML file is optional
/// and may set any subset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Owner restriction for snapshot listings; empty string disables it.
    #[serde(default = "default_owner_filter")]
    pub owner_filter: String,
}

fn default_poll_interval_ms() -> u64 {
    polling::POLL_INTERVAL.as_millis() as u64
}

fn default_max_poll_attempts() -> u32 {
    polling::MAX_POLL_ATTEMPTS
}

fn default_throttle_ms() -> u64 {
    purge::DEFAULT_THROTTLE_MS
}

fn default_owner_filter() -> String {
    "self".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            throttle_ms: default_throttle_ms(),
            owner_filter: default_owner_filter(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidValue {
                field: "poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_poll_attempts == 0 {
            return Err(ValidationError::InvalidValue {
                field: "max_poll_attempts".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn owner_filter(&self) -> Option<String> {
        if self.owner_filter.is_empty() {
            None
        } else {
            Some(self.owner_filter.clone())
        }
    }
}
