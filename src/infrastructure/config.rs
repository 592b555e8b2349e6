//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid concurrency_cap: {0}. Must be between 1 and 64")]
    InvalidConcurrencyCap(usize),

    #[error("Invalid per_task_timeout_secs: {0}. Must be positive")]
    InvalidPerTaskTimeout(u64),

    #[error("Invalid global_deadline_secs: {0}. Must be at least per_task_timeout_secs ({1})")]
    InvalidGlobalDeadline(u64, u64),

    #[error("Invalid monitor cadence: {0}. Must be positive")]
    InvalidCadence(u64),

    #[error("Invalid staleness threshold: {0}. Must be at least the cadence ({1})")]
    InvalidStaleness(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .sleuth/config.yaml (project config)
    /// 3. .sleuth/local.yaml (project local overrides, optional)
    /// 4. Environment variables (SLEUTH_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".sleuth/config.yaml"))
            .merge(Yaml::file(".sleuth/local.yaml"))
            .merge(Env::prefixed("SLEUTH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let executor = &config.executor;
        if executor.concurrency_cap == 0 || executor.concurrency_cap > 64 {
            return Err(ConfigError::InvalidConcurrencyCap(executor.concurrency_cap));
        }
        if executor.per_task_timeout_secs == 0 {
            return Err(ConfigError::InvalidPerTaskTimeout(executor.per_task_timeout_secs));
        }
        if executor.global_deadline_secs < executor.per_task_timeout_secs {
            return Err(ConfigError::InvalidGlobalDeadline(
                executor.global_deadline_secs,
                executor.per_task_timeout_secs,
            ));
        }

        let monitor = &config.monitor;
        if monitor.cadence_secs == 0 {
            return Err(ConfigError::InvalidCadence(monitor.cadence_secs));
        }
        if monitor.staleness_secs < monitor.cadence_secs {
            return Err(ConfigError::InvalidStaleness(
                monitor.staleness_secs,
                monitor.cadence_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExecutorConfig, LoggingConfig};
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = Config {
            executor: ExecutorConfig { concurrency_cap: 0, ..ExecutorConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrencyCap(0))
        ));
    }

    #[test]
    fn deadline_shorter_than_task_timeout_rejected() {
        let config = Config {
            executor: ExecutorConfig {
                per_task_timeout_secs: 120,
                global_deadline_secs: 60,
                ..ExecutorConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidGlobalDeadline(60, 120))
        ));
    }

    #[test]
    fn file_overrides_defaults() {
        let yaml = "\
executor:
  concurrency_cap: 8
logging:
  level: debug
";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.executor.concurrency_cap, 8);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults.
        assert_eq!(config.monitor.cadence_secs, 5);
    }

    #[test]
    fn bad_log_level_rejected() {
        let config = Config {
            logging: LoggingConfig { level: "loud".to_string(), ..LoggingConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
