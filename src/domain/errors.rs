//! Domain errors for the sleuth orchestration core.

use thiserror::Error;

/// Format a cycle path as a human-readable string: `a -> b -> c -> a`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Errors raised while validating a workflow definition.
///
/// These are hard preconditions: validation runs to completion before any
/// task executes, and a failure here means no execution was attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Duplicate task id in workflow: {0}")]
    DuplicateTask(String),

    #[error("Task {task_id} depends on unknown task {dependency_id}")]
    UnknownDependency { task_id: String, dependency_id: String },

    #[error("Dependency cycle detected: {}", format_cycle_path(.0))]
    CycleDetected(Vec<String>),
}

/// Errors raised by the triage router before any specialist executes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Classifier selected unknown specialist role: {0}")]
    UnknownRole(String),

    #[error("Classifier did not select a route: {0}")]
    NoRouteSelected(String),

    #[error("Specialist role already entered this run: {0}")]
    RoleAlreadyEntered(String),
}

/// Domain-level errors surfaced to callers of the orchestration core.
///
/// Per-task failures (capability errors, timeouts) are never surfaced this
/// way; they are folded into `TaskResult`s inside the execution report.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Definition file error: {0}")]
    DefinitionError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        DomainError::DefinitionError(err.to_string())
    }
}
