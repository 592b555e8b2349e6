//! Result correlator: aggregates task results and synthesizes a narrative.
//!
//! Pure aggregation plus one guarded call to the reasoning oracle. Failed
//! and timed-out tasks stay in the payload with their reasons so downstream
//! synthesis knows exactly which coverage gaps exist. The oracle is never
//! trusted to be reachable: on any failure the correlator degrades to
//! rendering the structured payload itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{Task, TaskResult, TaskResultStatus};
use crate::domain::ports::ReasoningOracle;

/// One task's contribution to a capability group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub task_id: String,
    pub status: TaskResultStatus,
    pub output: serde_json::Value,
}

/// A failed or unfinished task, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageGap {
    pub task_id: String,
    pub status: TaskResultStatus,
    pub reason: String,
}

/// Structured aggregation of a run's task results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelatedPayload {
    /// Results grouped by the capability that produced them.
    pub capability_groups: BTreeMap<String, Vec<GroupEntry>>,
    /// Tasks that errored, timed out, or never ran.
    pub coverage_gaps: Vec<CoverageGap>,
    pub total_tasks: usize,
    pub succeeded_tasks: usize,
}

/// Aggregates results and forwards them to the oracle for narration.
pub struct ResultCorrelator {
    oracle: Arc<dyn ReasoningOracle>,
    oracle_timeout: Duration,
}

impl ResultCorrelator {
    pub fn new(oracle: Arc<dyn ReasoningOracle>, oracle_timeout: Duration) -> Self {
        Self { oracle, oracle_timeout }
    }

    /// Pure aggregation of task results into one structured payload.
    ///
    /// A task contributes an entry to the group of every capability it
    /// declared; tasks without capabilities land under `uncategorized`.
    pub fn correlate(
        &self,
        tasks: &[Task],
        results: &BTreeMap<String, TaskResult>,
    ) -> CorrelatedPayload {
        let mut payload = CorrelatedPayload {
            total_tasks: tasks.len(),
            ..CorrelatedPayload::default()
        };

        for task in tasks {
            let Some(result) = results.get(&task.id) else {
                continue;
            };

            if result.is_success() {
                payload.succeeded_tasks += 1;
            } else {
                payload.coverage_gaps.push(CoverageGap {
                    task_id: task.id.clone(),
                    status: result.status,
                    reason: result
                        .error_message
                        .clone()
                        .unwrap_or_else(|| result.status.as_str().to_string()),
                });
            }

            let groups: Vec<&str> = if task.required_capabilities.is_empty() {
                vec!["uncategorized"]
            } else {
                task.required_capabilities.iter().map(String::as_str).collect()
            };
            for capability in groups {
                payload
                    .capability_groups
                    .entry(capability.to_string())
                    .or_default()
                    .push(GroupEntry {
                        task_id: task.id.clone(),
                        status: result.status,
                        output: result.output.get(capability).cloned().unwrap_or_else(|| {
                            if task.required_capabilities.is_empty() {
                                result.output.clone()
                            } else {
                                serde_json::Value::Null
                            }
                        }),
                    });
            }
        }

        payload
    }

    /// Ask the oracle for a narrative; fall back to the rendered payload.
    ///
    /// Never errors and never blocks past the oracle timeout.
    pub async fn synthesize(&self, payload: &CorrelatedPayload) -> String {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "payload serialization failed");
                return format!("{payload:?}");
            }
        };

        match tokio::time::timeout(self.oracle_timeout, self.oracle.synthesize(&value)).await {
            Ok(Ok(narrative)) => narrative,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "oracle synthesis failed, using raw payload");
                render_fallback(&value)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.oracle_timeout.as_secs(),
                    "oracle synthesis timed out, using raw payload"
                );
                render_fallback(&value)
            }
        }
    }
}

fn render_fallback(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::capability::oracle::ScriptedOracle;
    use chrono::Utc;

    fn task(id: &str, capabilities: &[&str]) -> Task {
        Task::new(id, id).with_capabilities(capabilities.iter().copied())
    }

    fn result(id: &str, status: TaskResultStatus, output: serde_json::Value) -> TaskResult {
        TaskResult {
            task_id: id.to_string(),
            status,
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
            output,
            error_message: match status {
                TaskResultStatus::Error => Some("query failed".to_string()),
                _ => None,
            },
        }
    }

    fn correlator(oracle: ScriptedOracle) -> ResultCorrelator {
        ResultCorrelator::new(Arc::new(oracle), Duration::from_secs(5))
    }

    #[test]
    fn groups_by_capability_and_lists_gaps() {
        let tasks = vec![task("a", &["log_search"]), task("b", &["log_search"]), task("c", &["metrics"])];
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            result("a", TaskResultStatus::Success, serde_json::json!({"log_search": {"hits": 2}})),
        );
        results.insert(
            "b".to_string(),
            result("b", TaskResultStatus::Error, serde_json::Value::Null),
        );
        results.insert(
            "c".to_string(),
            result("c", TaskResultStatus::Timeout, serde_json::Value::Null),
        );

        let payload = correlator(ScriptedOracle::new()).correlate(&tasks, &results);

        assert_eq!(payload.capability_groups["log_search"].len(), 2);
        assert_eq!(payload.capability_groups["metrics"].len(), 1);
        assert_eq!(payload.coverage_gaps.len(), 2);
        assert_eq!(payload.succeeded_tasks, 1);
        assert!(payload
            .coverage_gaps
            .iter()
            .any(|gap| gap.task_id == "b" && gap.reason == "query failed"));
    }

    #[tokio::test]
    async fn synthesize_uses_oracle_narrative() {
        let correlator = correlator(ScriptedOracle::new().with_narrative("All clear."));
        let narrative = correlator.synthesize(&CorrelatedPayload::default()).await;
        assert_eq!(narrative, "All clear.");
    }

    #[tokio::test]
    async fn synthesize_falls_back_when_oracle_fails() {
        let correlator = correlator(ScriptedOracle::new().failing_synthesis());
        let payload = CorrelatedPayload { total_tasks: 3, ..CorrelatedPayload::default() };
        let narrative = correlator.synthesize(&payload).await;
        // Raw structured payload rendered as the narrative.
        assert!(narrative.contains("\"total_tasks\": 3"));
    }
}
