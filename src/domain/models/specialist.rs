//! Specialist profiles and the triage handoff state machine types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;
use super::trace::StepSummary;
use super::workflow::WorkflowExecutionReport;

/// One routing target in triage mode: a named execution track with its own
/// capability set and task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistProfile {
    /// Unique within a router configuration.
    pub role_name: String,
    #[serde(default)]
    pub description: String,
    /// Capabilities this specialist is allowed to invoke.
    #[serde(default)]
    pub capability_set: Vec<String>,
    /// Instructions handed to the specialist at handoff, alongside the
    /// accumulated investigation context.
    #[serde(default)]
    pub handoff_instructions: String,
    /// The specialist's own task list, executed with the same scheduler and
    /// phase executor as any workflow.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// State of a triage run.
///
/// ```text
/// Init -> Routed -> SpecialistActive -> Complete | Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TriageState {
    /// Holding the raw problem description; no route chosen yet.
    Init,
    /// A specialist was selected and validated; handoff recorded.
    Routed { role: String },
    /// The specialist's task list is executing.
    SpecialistActive { role: String },
    /// The specialist finished.
    Complete { role: String },
    /// The specialist's run exhausted the deadline or every task errored.
    Failed { role: String, reason: String },
}

impl TriageState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Routed { .. } => "routed",
            Self::SpecialistActive { .. } => "specialist_active",
            Self::Complete { .. } => "complete",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

/// Record of one triage dispatch. Immutable once appended to the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub from_state: String,
    pub to_role: String,
    /// Opaque reference to the classifier's rationale.
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a triage run: the handoff record, the specialist's execution
/// report, and the structured digest of the run's trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub routing_decision: RoutingDecision,
    pub final_state: TriageState,
    /// Full state transition history, in order.
    pub audit_trail: Vec<RoutingDecision>,
    pub specialist_report: WorkflowExecutionReport,
    pub step_summary: StepSummary,
}
