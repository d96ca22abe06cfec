// File: snapshotter/src/config/manager.rs
use super::Settings;
use crate::errors::{ConfigError, SnapshotterError};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_settings: Settings,
}

impl ConfigManager {
    /// Loads settings from `path`, or uses the defaults when no file is given.
    pub async fn new(path: Option<&Path>) -> Result<Self, SnapshotterError> {
        let settings = match path {
            Some(path) => Self::load_settings(path).await?,
            None => {
                debug!("No config file given, using default settings");
                Settings::default()
            }
        };

        settings.validate()?;

        Ok(Self {
            current_settings: settings,
        })
    }

    pub fn get_current_settings(&self) -> &Settings {
        &self.current_settings
    }

    /// Applies the `--throttle` flag on top of the file value.
    pub fn with_throttle_override(mut self, throttle_ms: Option<u64>) -> Self {
        if let Some(throttle_ms) = throttle_ms {
            self.current_settings.throttle_ms = throttle_ms;
        }
        self
    }

    async fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(
            "Settings loaded from {}: poll every {}ms, up to {} attempts, throttle {}ms",
            path.display(),
            settings.poll_interval_ms,
            settings.max_poll_attempts,
            settings.throttle_ms
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_settings_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 1000\nmax_poll_attempts = 30").unwrap();

        let manager = ConfigManager::new(Some(file.path())).await.unwrap();
        let settings = manager.get_current_settings();
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.max_poll_attempts, 30);
        assert_eq!(settings.throttle_ms, 250);
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let err = ConfigManager::new(Some(Path::new("/nonexistent/snapshotter.toml")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SnapshotterError::Config(ConfigError::LoadFailed { .. })));
    }

    #[tokio::test]
    async fn test_invalid_file_values_are_validation_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 0").unwrap();

        let err = ConfigManager::new(Some(file.path())).await.err().unwrap();
        assert!(matches!(err, SnapshotterError::Validation(_)));
    }

    #[tokio::test]
    async fn test_throttle_flag_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "throttle_ms = 900").unwrap();

        let manager = ConfigManager::new(Some(file.path()))
            .await
            .unwrap()
            .with_throttle_override(Some(40));
        assert_eq!(manager.get_current_settings().throttle_ms, 40);

        let manager = ConfigManager::new(None).await.unwrap().with_throttle_override(None);
        assert_eq!(manager.get_current_settings().throttle_ms, 250);
    }
}
