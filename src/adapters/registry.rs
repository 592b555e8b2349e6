//! In-memory registries for workflow definitions and specialist profiles.
//!
//! Populated programmatically or from YAML definition files. Registries are
//! immutable after construction; the orchestration core only reads them.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SpecialistProfile, WorkflowDefinition, WorkflowSummary};
use crate::domain::ports::{SpecialistRegistry, WorkflowRegistry};

/// Workflow registry backed by a map.
#[derive(Debug)]
pub struct InMemoryWorkflowRegistry {
    workflows: BTreeMap<String, WorkflowDefinition>,
}

impl InMemoryWorkflowRegistry {
    pub fn new(workflows: Vec<WorkflowDefinition>) -> Self {
        Self {
            workflows: workflows
                .into_iter()
                .map(|w| (w.workflow_id.clone(), w))
                .collect(),
        }
    }

    /// Load definitions from a YAML file holding a list of workflows.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            DomainError::DefinitionError(format!(
                "cannot read {}: {err}",
                path.as_ref().display()
            ))
        })?;
        let workflows: Vec<WorkflowDefinition> = serde_yaml::from_str(&raw)?;
        Ok(Self::new(workflows))
    }
}

impl WorkflowRegistry for InMemoryWorkflowRegistry {
    fn list(&self) -> Vec<WorkflowSummary> {
        self.workflows.values().map(WorkflowSummary::from).collect()
    }

    fn get(&self, workflow_id: &str) -> Option<WorkflowDefinition> {
        self.workflows.get(workflow_id).cloned()
    }
}

/// Specialist registry preserving declaration order.
pub struct InMemorySpecialistRegistry {
    profiles: Vec<SpecialistProfile>,
}

impl InMemorySpecialistRegistry {
    pub fn new(profiles: Vec<SpecialistProfile>) -> Self {
        Self { profiles }
    }

    /// Load profiles from a YAML file holding a list of specialists.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            DomainError::DefinitionError(format!(
                "cannot read {}: {err}",
                path.as_ref().display()
            ))
        })?;
        let profiles: Vec<SpecialistProfile> = serde_yaml::from_str(&raw)?;
        Ok(Self::new(profiles))
    }
}

impl SpecialistRegistry for InMemorySpecialistRegistry {
    fn lookup(&self, role_name: &str) -> Option<SpecialistProfile> {
        self.profiles.iter().find(|p| p.role_name == role_name).cloned()
    }

    fn profiles(&self) -> Vec<SpecialistProfile> {
        self.profiles.clone()
    }
}
