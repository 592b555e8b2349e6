//! Workflow definition and execution report models.
//!
//! A `WorkflowDefinition` is an immutable, named bundle of tasks owned by the
//! registry that supplies it. Reports are created per run and handed to the
//! caller; the core keeps no reference to them afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::task::{Task, TaskResult, TaskResultStatus};

/// A named, reusable bundle of tasks forming a dependency DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Insertion order is irrelevant to execution; the scheduler levels
    /// the dependency graph into phases.
    pub tasks: Vec<Task>,
}

impl WorkflowDefinition {
    pub fn new(workflow_id: impl Into<String>, name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            name: name.into(),
            description: String::new(),
            tasks,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One-line summary of a workflow, for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub name: String,
    pub description: String,
    pub task_count: usize,
}

impl From<&WorkflowDefinition> for WorkflowSummary {
    fn from(def: &WorkflowDefinition) -> Self {
        Self {
            workflow_id: def.workflow_id.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            task_count: def.tasks.len(),
        }
    }
}

/// A maximal set of tasks whose dependencies are all satisfied by strictly
/// earlier phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPhase {
    pub phase_index: usize,
    pub task_ids: Vec<String>,
}

/// Shared, read-only context handed to every task and, in triage mode,
/// transferred unmodified to the chosen specialist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestigationContext {
    /// Time window under investigation, e.g. `-24h` or an absolute range.
    pub time_window: Option<String>,
    /// Index/source/host filters narrowing the search scope.
    #[serde(default)]
    pub focus_filters: BTreeMap<String, String>,
    /// Findings carried over from earlier investigation steps.
    #[serde(default)]
    pub prior_findings: Vec<String>,
}

impl InvestigationContext {
    pub fn with_time_window(mut self, window: impl Into<String>) -> Self {
        self.time_window = Some(window.into());
        self
    }
}

/// Overall status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every task settled within the deadline (individual tasks may have
    /// errored or timed out; coverage gaps are visible in the task results).
    Complete,
    /// The global deadline elapsed with work remaining; some results are
    /// timeout/skipped.
    Partial,
    /// Every task failed.
    Failed,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of running a whole workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecutionReport {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub phases_run: usize,
    pub task_results: BTreeMap<String, TaskResult>,
    pub overall_status: OverallStatus,
    /// True when the global deadline cut the run short.
    pub deadline_exceeded: bool,
    /// 1.0 for a single fully-parallel phase, 0.0 for a serial chain,
    /// `1 - (P-1)/(N-1)` in general.
    pub parallel_efficiency: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Narrative synthesized from the correlated results, or the rendered
    /// structured payload when the reasoning oracle is unavailable.
    pub narrative: String,
}

impl WorkflowExecutionReport {
    /// Derive the overall status from the recorded task results.
    ///
    /// Only a global-deadline cut-off degrades the run to Partial; a
    /// per-task timeout is an isolated failure in the same class as a
    /// capability error. Partial wins over Failed: a deadline cut-off is a
    /// coverage statement, not a verdict on the work that did run.
    pub fn derive_status(results: &BTreeMap<String, TaskResult>, deadline_hit: bool) -> OverallStatus {
        if deadline_hit {
            OverallStatus::Partial
        } else if !results.is_empty()
            && results.values().all(|r| {
                matches!(r.status, TaskResultStatus::Error | TaskResultStatus::Timeout)
            })
        {
            OverallStatus::Failed
        } else {
            OverallStatus::Complete
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.task_results.values().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.task_results
            .values()
            .filter(|r| r.status == TaskResultStatus::Error)
            .count()
    }
}

/// Parallel efficiency of a schedule: how far P phases over N tasks sit
/// between fully parallel (1.0) and fully serial (0.0).
pub fn parallel_efficiency(task_count: usize, phase_count: usize) -> f64 {
    if task_count <= 1 {
        return 1.0;
    }
    1.0 - (phase_count.saturating_sub(1) as f64) / ((task_count - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, status: TaskResultStatus) -> TaskResult {
        TaskResult {
            task_id: id.to_string(),
            status,
            started_at: None,
            finished_at: None,
            output: serde_json::Value::Null,
            error_message: None,
        }
    }

    #[test]
    fn efficiency_single_task_is_one() {
        assert!((parallel_efficiency(1, 1) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn efficiency_serial_chain_is_zero() {
        assert!(parallel_efficiency(4, 4).abs() < f64::EPSILON);
    }

    #[test]
    fn efficiency_fan_in_interpolates() {
        // A, B independent; C depends on both: 2 phases over 3 tasks.
        assert!((parallel_efficiency(3, 2) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn status_partial_when_deadline_hit() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", TaskResultStatus::Success));
        results.insert("b".to_string(), result("b", TaskResultStatus::Skipped));
        assert_eq!(
            WorkflowExecutionReport::derive_status(&results, true),
            OverallStatus::Partial
        );
    }

    #[test]
    fn status_complete_tolerates_per_task_timeout() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", TaskResultStatus::Success));
        results.insert("b".to_string(), result("b", TaskResultStatus::Timeout));
        assert_eq!(
            WorkflowExecutionReport::derive_status(&results, false),
            OverallStatus::Complete
        );
    }

    #[test]
    fn status_failed_when_nothing_succeeds() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", TaskResultStatus::Error));
        results.insert("b".to_string(), result("b", TaskResultStatus::Timeout));
        assert_eq!(
            WorkflowExecutionReport::derive_status(&results, false),
            OverallStatus::Failed
        );
    }

    #[test]
    fn status_failed_when_all_error() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", TaskResultStatus::Error));
        results.insert("b".to_string(), result("b", TaskResultStatus::Error));
        assert_eq!(
            WorkflowExecutionReport::derive_status(&results, false),
            OverallStatus::Failed
        );
    }

    #[test]
    fn status_complete_tolerates_individual_errors() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", TaskResultStatus::Success));
        results.insert("b".to_string(), result("b", TaskResultStatus::Error));
        assert_eq!(
            WorkflowExecutionReport::derive_status(&results, false),
            OverallStatus::Complete
        );
    }
}
