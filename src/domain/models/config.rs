//! Runtime configuration model.
//!
//! Loaded hierarchically by `infrastructure::config::ConfigLoader`
//! (defaults, project yaml, local overrides, `SLEUTH_` env vars).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub triage: TriageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub definitions: DefinitionsConfig,
}

/// Phase executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum concurrent capability invocations across a phase.
    pub concurrency_cap: usize,
    /// Timeout for one task (all of its capability invocations), seconds.
    pub per_task_timeout_secs: u64,
    /// Deadline for the whole run, seconds.
    pub global_deadline_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency_cap: 4,
            per_task_timeout_secs: 120,
            global_deadline_secs: 900,
        }
    }
}

impl ExecutorConfig {
    pub fn per_task_timeout(&self) -> Duration {
        Duration::from_secs(self.per_task_timeout_secs)
    }

    pub fn global_deadline(&self) -> Duration {
        Duration::from_secs(self.global_deadline_secs)
    }
}

/// Progress monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Heartbeat cadence during long operations, seconds.
    pub cadence_secs: u64,
    /// How long without a progress event before a staleness warning fires.
    pub staleness_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { cadence_secs: 5, staleness_secs: 30 }
    }
}

impl MonitorConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }

    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

/// Triage router settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Role used when the classifier returns a blank route. When unset a
    /// blank route is a `NoRouteSelected` error.
    pub default_role: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    /// One of: json, pretty.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Paths to definition files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// YAML file of workflow definitions.
    pub workflows_path: String,
    /// YAML file of specialist profiles.
    pub specialists_path: String,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            workflows_path: ".sleuth/workflows.yaml".to_string(),
            specialists_path: ".sleuth/specialists.yaml".to_string(),
        }
    }
}
