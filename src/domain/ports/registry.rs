//! Registry ports - immutable configuration suppliers.
//!
//! Workflow definitions and specialist profiles are owned by the registries
//! that supply them; the orchestration core reads, never mutates.

use crate::domain::models::{SpecialistProfile, WorkflowDefinition, WorkflowSummary};

/// Supplier of workflow definitions.
pub trait WorkflowRegistry: Send + Sync {
    /// Summaries of every registered workflow.
    fn list(&self) -> Vec<WorkflowSummary>;

    /// Fetch one workflow by id.
    fn get(&self, workflow_id: &str) -> Option<WorkflowDefinition>;
}

/// Supplier of specialist profiles for triage routing.
pub trait SpecialistRegistry: Send + Sync {
    /// Fetch one profile by role name.
    fn lookup(&self, role_name: &str) -> Option<SpecialistProfile>;

    /// All configured profiles, in declaration order.
    fn profiles(&self) -> Vec<SpecialistProfile>;
}
