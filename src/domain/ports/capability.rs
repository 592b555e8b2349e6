//! Capability executor port - interface to the monitored system's tooling.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors a capability invocation can raise.
///
/// The phase executor converts these to `TaskResult`s; they never abort
/// sibling tasks.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("Capability not found: {0}")]
    NotFound(String),

    #[error("Capability {capability} failed: {message}")]
    ExecutionFailed { capability: String, message: String },

    #[error("Capability {capability} timed out")]
    Timeout { capability: String },
}

/// Output of one capability invocation.
#[derive(Debug, Clone)]
pub struct CapabilityResult {
    pub capability: String,
    pub output: serde_json::Value,
}

/// Trait for the external executor that performs actual search/query/tool
/// work against the monitored system.
///
/// Supplied by the caller (dependency injection, no global registry). The
/// orchestration core only ever calls `invoke` from within a semaphore slot
/// and wraps it with the per-task timeout and the run's cancellation token.
#[async_trait]
pub trait CapabilityExecutor: Send + Sync {
    /// Invoke a capability by name.
    ///
    /// `timeout` is advisory for the remote side; the executor enforces its
    /// own per-task timeout around the whole invocation regardless.
    async fn invoke(
        &self,
        capability: &str,
        arguments: serde_json::Value,
        timeout: Duration,
    ) -> Result<CapabilityResult, CapabilityError>;

    /// Capabilities this executor can serve, for validation and display.
    fn capabilities(&self) -> Vec<String>;
}
