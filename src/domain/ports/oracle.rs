//! Reasoning/classification oracle port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::SpecialistProfile;

/// Error from the external reasoning service.
#[derive(Debug, Clone, Error)]
#[error("Oracle call failed: {0}")]
pub struct OracleError(pub String);

/// Black-box natural-language reasoning service.
///
/// Both calls are treated like any other capability invocation: subject to
/// timeout wrapping and never trusted to be reachable. The correlator
/// degrades to the raw structured payload when `synthesize` fails; the
/// router surfaces a `RoutingError` when `classify` fails.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Choose one specialist role for a free-form problem description.
    ///
    /// Returns the selected `role_name`. The router validates the role
    /// against its registry; an unknown role is a routing error, never a
    /// guess.
    async fn classify(
        &self,
        problem_text: &str,
        profiles: &[SpecialistProfile],
    ) -> Result<String, OracleError>;

    /// Produce a prose narrative from a structured correlation payload.
    async fn synthesize(&self, payload: &serde_json::Value) -> Result<String, OracleError>;
}
