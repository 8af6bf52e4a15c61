//! Configuration management for the dispatch location service.
//!
//! Handles loading, validation and conversion of settings from a TOML file.

use driver_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_history_capacity() -> usize {
    driver_store::store::DEFAULT_HISTORY_CAPACITY
}
fn default_envelope_padding_deg() -> f64 {
    driver_store::spatial::DEFAULT_ENVELOPE_PADDING
}
fn default_sweeper_enabled() -> bool { true }
fn default_sweep_interval_ms() -> u64 { 5_000 }
fn default_stats_interval_secs() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Driver store settings
    #[serde(default)]
    pub store: StoreSettings,
    /// Expiry sweeper settings
    #[serde(default)]
    pub sweeper: SweeperSettings,
    /// Periodic statistics reporting
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Driver store settings, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Recent positions retained per driver
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Half-width of the box indexed around each driver, in degrees
    #[serde(default = "default_envelope_padding_deg")]
    pub envelope_padding_deg: f64,
}

/// Expiry sweeper configuration.
///
/// The store itself never reaps expired drivers; this service does, on a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweeperSettings {
    #[serde(default = "default_sweeper_enabled")]
    pub enabled: bool,
    /// Interval between sweeps in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Interval between statistics reports in seconds (0 disables reporting)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            envelope_padding_deg: default_envelope_padding_deg(),
        }
    }
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            enabled: default_sweeper_enabled(),
            interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// Where a loaded configuration came from.
///
/// Loading happens before logging is up, so the caller reports this once the
/// subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from an existing file
    File,
    /// The file was missing; defaults were written to it
    CreatedDefault,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file is created with the default configuration, which is
    /// then returned along with [`ConfigOrigin::CreatedDefault`].
    pub async fn load_from_file(
        path: &Path,
    ) -> Result<(Self, ConfigOrigin), Box<dyn std::error::Error>> {
        if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok((config, ConfigOrigin::File))
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            Ok((default_config, ConfigOrigin::CreatedDefault))
        }
    }

    /// Converts the file settings into the store's construction settings.
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            history_capacity: self.store.history_capacity,
            envelope_padding: self.store.envelope_padding_deg,
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.store.history_capacity == 0 {
            return Err("store.history_capacity must be at least 1".to_string());
        }

        let padding = self.store.envelope_padding_deg;
        if !padding.is_finite() || padding <= 0.0 || padding >= 1.0 {
            return Err(format!(
                "store.envelope_padding_deg must be in (0, 1), got {padding}"
            ));
        }

        if self.sweeper.enabled && self.sweeper.interval_ms == 0 {
            return Err("sweeper.interval_ms must be positive when the sweeper is enabled".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.store.history_capacity, 16);
        assert_eq!(config.store.envelope_padding_deg, 0.01);
        assert!(config.sweeper.enabled);
        assert_eq!(config.sweeper.interval_ms, 5_000);
        assert_eq!(config.monitoring.stats_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_store_config_conversion() {
        let mut config = AppConfig::default();
        config.store.history_capacity = 3;
        config.store.envelope_padding_deg = 0.05;

        let store_config = config.to_store_config();
        assert_eq!(store_config.history_capacity, 3);
        assert_eq!(store_config.envelope_padding, 0.05);
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let mut config = AppConfig::default();
        config.store.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_padding() {
        for padding in [0.0, -0.1, 1.5, f64::NAN] {
            let mut config = AppConfig::default();
            config.store.envelope_padding_deg = padding;
            assert!(config.validate().is_err(), "padding {padding} accepted");
        }
    }

    #[test]
    fn test_validation_sweeper_interval() {
        let mut config = AppConfig::default();
        config.sweeper.interval_ms = 0;
        assert!(config.validate().is_err());

        config.sweeper.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_log_levels() {
        let mut config = AppConfig::default();
        for level in ["trace", "debug", "info", "warn", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok());
        }
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_deserialization_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            history_capacity = 8

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.history_capacity, 8);
        assert_eq!(config.store.envelope_padding_deg, 0.01);
        assert_eq!(config.sweeper, SweeperSettings::default());
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let (config, origin) = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(origin, ConfigOrigin::CreatedDefault);
        assert!(path.exists());

        let (reloaded, origin) = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(origin, ConfigOrigin::File);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        tokio::fs::write(
            &path,
            r#"
            [store]
            history_capacity = 4
            envelope_padding_deg = 0.02

            [sweeper]
            enabled = false
            interval_ms = 100
            "#,
        )
        .await
        .unwrap();

        let (config, origin) = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(origin, ConfigOrigin::File);
        assert_eq!(config.store.history_capacity, 4);
        assert_eq!(config.store.envelope_padding_deg, 0.02);
        assert!(!config.sweeper.enabled);
        assert_eq!(config.monitoring, MonitoringSettings::default());
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[store\nhistory_capacity = ").await.unwrap();
        assert!(AppConfig::load_from_file(&path).await.is_err());
    }
}
