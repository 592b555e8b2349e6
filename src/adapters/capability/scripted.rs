//! Scripted capability executor for tests and dry runs.
//!
//! Plays canned per-capability responses with optional latency and failure,
//! and tracks peak concurrent invocations so tests can assert the executor's
//! admission control.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::ports::{CapabilityError, CapabilityExecutor, CapabilityResult};

/// Canned response for one capability.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub output: serde_json::Value,
    pub fail: bool,
    pub error_message: Option<String>,
    pub latency: Duration,
}

impl ScriptedResponse {
    pub fn success(output: serde_json::Value) -> Self {
        Self { output, fail: false, error_message: None, latency: Duration::ZERO }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: serde_json::Value::Null,
            fail: true,
            error_message: Some(error.into()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Tracks current and peak concurrent invocations.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    /// Highest number of simultaneous invocations observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

// Decrements the gauge even when an invocation errors out early.
struct GaugeGuard<'a>(&'a ConcurrencyGauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.exit();
    }
}

/// Capability executor that replays scripted responses.
pub struct ScriptedCapabilityExecutor {
    responses: Mutex<HashMap<String, ScriptedResponse>>,
    invocations: Mutex<Vec<String>>,
    gauge: Arc<ConcurrencyGauge>,
}

impl ScriptedCapabilityExecutor {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            invocations: Mutex::new(Vec::new()),
            gauge: Arc::new(ConcurrencyGauge::default()),
        }
    }

    /// Register (or replace) the canned response for a capability.
    pub fn set_response(&self, capability: impl Into<String>, response: ScriptedResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(capability.into(), response);
        }
    }

    /// Capability names in invocation order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Shared concurrency gauge for asserting admission control.
    pub fn concurrency_gauge(&self) -> Arc<ConcurrencyGauge> {
        Arc::clone(&self.gauge)
    }
}

impl Default for ScriptedCapabilityExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityExecutor for ScriptedCapabilityExecutor {
    async fn invoke(
        &self,
        capability: &str,
        _arguments: serde_json::Value,
        _timeout: Duration,
    ) -> Result<CapabilityResult, CapabilityError> {
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(capability).cloned())
            .ok_or_else(|| CapabilityError::NotFound(capability.to_string()))?;

        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(capability.to_string());
        }

        self.gauge.enter();
        let _guard = GaugeGuard(&self.gauge);

        if !response.latency.is_zero() {
            tokio::time::sleep(response.latency).await;
        }

        if response.fail {
            return Err(CapabilityError::ExecutionFailed {
                capability: capability.to_string(),
                message: response
                    .error_message
                    .unwrap_or_else(|| "scripted failure".to_string()),
            });
        }

        Ok(CapabilityResult {
            capability: capability.to_string(),
            output: response.output,
        })
    }

    fn capabilities(&self) -> Vec<String> {
        self.responses
            .lock()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }
}
