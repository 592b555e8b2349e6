//! Task domain model.
//!
//! Tasks are discrete units of diagnostic work. Their dependency relation
//! forms a DAG that the scheduler levels into execution phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One declared unit of diagnostic work within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id within the owning workflow.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Opaque instructions passed through to the capability executor.
    #[serde(default)]
    pub instructions: String,
    /// Capabilities invoked by this task, in declared order.
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    /// Ids of tasks that must finish before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Context keys this task reads from the shared investigation context.
    #[serde(default)]
    pub context_requirements: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructions: String::new(),
            required_capabilities: Vec::new(),
            dependencies: Vec::new(),
            context_requirements: Vec::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Terminal status of one executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskResultStatus {
    /// All capability invocations completed.
    Success,
    /// A capability invocation raised an error.
    Error,
    /// The per-task timeout expired or the run was cancelled mid-flight.
    Timeout,
    /// The task never started because the global deadline elapsed first.
    Skipped,
}

impl TaskResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of executing one task. Terminal once recorded; the executor
/// never mutates a result after storing it in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskResultStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Opaque payload produced by the task's capability invocations,
    /// keyed by capability name.
    pub output: serde_json::Value,
    pub error_message: Option<String>,
}

impl TaskResult {
    /// Result for a task that never ran because the global deadline elapsed.
    pub fn skipped(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskResultStatus::Skipped,
            started_at: None,
            finished_at: None,
            output: serde_json::Value::Null,
            error_message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskResultStatus::Success
    }
}
