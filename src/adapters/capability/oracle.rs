//! Scripted reasoning oracle for tests and dry runs.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::models::SpecialistProfile;
use crate::domain::ports::{OracleError, ReasoningOracle};

/// Oracle that replays a scripted route and narrative.
pub struct ScriptedOracle {
    route: Mutex<Option<String>>,
    narrative: Mutex<Option<String>>,
    fail_classify: bool,
    fail_synthesize: bool,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            route: Mutex::new(None),
            narrative: Mutex::new(None),
            fail_classify: false,
            fail_synthesize: false,
        }
    }

    /// Script the role `classify` returns.
    pub fn with_route(self, role: impl Into<String>) -> Self {
        if let Ok(mut route) = self.route.lock() {
            *route = Some(role.into());
        }
        self
    }

    /// Script the narrative `synthesize` returns.
    pub fn with_narrative(self, narrative: impl Into<String>) -> Self {
        if let Ok(mut text) = self.narrative.lock() {
            *text = Some(narrative.into());
        }
        self
    }

    /// Make `classify` fail.
    pub fn failing_classification(mut self) -> Self {
        self.fail_classify = true;
        self
    }

    /// Make `synthesize` fail, exercising the correlator's fallback.
    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesize = true;
        self
    }
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn classify(
        &self,
        _problem_text: &str,
        profiles: &[SpecialistProfile],
    ) -> Result<String, OracleError> {
        if self.fail_classify {
            return Err(OracleError("scripted classify failure".to_string()));
        }
        let scripted = self.route.lock().ok().and_then(|r| r.clone());
        match scripted {
            Some(role) => Ok(role),
            // Unscripted: behave like a trivially confident classifier.
            None => profiles
                .first()
                .map(|p| p.role_name.clone())
                .ok_or_else(|| OracleError("no profiles configured".to_string())),
        }
    }

    async fn synthesize(&self, payload: &serde_json::Value) -> Result<String, OracleError> {
        if self.fail_synthesize {
            return Err(OracleError("scripted synthesize failure".to_string()));
        }
        let scripted = self.narrative.lock().ok().and_then(|n| n.clone());
        Ok(scripted.unwrap_or_else(|| format!("Summary of {} result groups.", group_count(payload))))
    }
}

fn group_count(payload: &serde_json::Value) -> usize {
    payload
        .get("capability_groups")
        .and_then(|g| g.as_object())
        .map_or(0, serde_json::Map::len)
}
