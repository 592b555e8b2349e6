//! Workflow validation: duplicate ids, unknown dependencies, cycles.
//!
//! Validation is a hard precondition. It runs to completion before any task
//! executes; a failure here means no execution was attempted.

use std::collections::{HashMap, HashSet};

use crate::domain::errors::ValidationError;
use crate::domain::models::{Task, WorkflowDefinition};

/// Validates workflow definitions before scheduling.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowValidator;

// Standalone DFS helper for cycle detection (no self needed).
fn detect_cycle_util<'a>(
    node: &'a str,
    graph: &'a HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(neighbor) {
                // Trim the path down to the cycle itself and close it.
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    path.push(neighbor);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

impl WorkflowValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a workflow definition.
    ///
    /// Checks, in order: duplicate task ids, dangling dependency references,
    /// dependency cycles. Fails fast on the first violation.
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<(), ValidationError> {
        self.validate_tasks(&workflow.tasks)
    }

    /// Validate a bare task set (used for specialist task lists too).
    pub fn validate_tasks(&self, tasks: &[Task]) -> Result<(), ValidationError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for task in tasks {
            if !seen.insert(&task.id) {
                return Err(ValidationError::DuplicateTask(task.id.clone()));
            }
        }

        for task in tasks {
            for dep in &task.dependencies {
                if !seen.contains(dep.as_str()) {
                    return Err(ValidationError::UnknownDependency {
                        task_id: task.id.clone(),
                        dependency_id: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = Self::detect_cycle(tasks) {
            return Err(ValidationError::CycleDetected(cycle));
        }

        Ok(())
    }

    /// Detect a dependency cycle, returning the closed cycle path if any.
    fn detect_cycle(tasks: &[Task]) -> Option<Vec<String>> {
        let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in tasks {
            graph
                .entry(&task.id)
                .or_default()
                .extend(task.dependencies.iter().map(String::as_str));
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        // Iterate tasks (not graph keys) for a deterministic starting order.
        for task in tasks {
            if !visited.contains(task.id.as_str())
                && detect_cycle_util(&task.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path.into_iter().map(str::to_string).collect());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, id).with_dependencies(deps.iter().copied())
    }

    fn workflow(tasks: Vec<Task>) -> WorkflowDefinition {
        WorkflowDefinition::new("wf", "test", tasks)
    }

    #[test]
    fn valid_workflow_passes() {
        let wf = workflow(vec![task("a", &[]), task("b", &["a"]), task("c", &["a", "b"])]);
        assert!(WorkflowValidator::new().validate(&wf).is_ok());
    }

    #[test]
    fn duplicate_task_id_rejected() {
        let wf = workflow(vec![task("a", &[]), task("a", &[])]);
        assert_eq!(
            WorkflowValidator::new().validate(&wf),
            Err(ValidationError::DuplicateTask("a".to_string()))
        );
    }

    #[test]
    fn unknown_dependency_rejected() {
        let wf = workflow(vec![task("a", &["ghost"])]);
        assert_eq!(
            WorkflowValidator::new().validate(&wf),
            Err(ValidationError::UnknownDependency {
                task_id: "a".to_string(),
                dependency_id: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn two_node_cycle_rejected() {
        let wf = workflow(vec![task("a", &["b"]), task("b", &["a"])]);
        match WorkflowValidator::new().validate(&wf) {
            Err(ValidationError::CycleDetected(path)) => {
                assert!(path.len() >= 3);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_cycle_rejected() {
        let wf = workflow(vec![task("a", &["a"])]);
        assert!(matches!(
            WorkflowValidator::new().validate(&wf),
            Err(ValidationError::CycleDetected(_))
        ));
    }

    #[test]
    fn cycle_behind_valid_prefix_detected() {
        let wf = workflow(vec![
            task("a", &[]),
            task("b", &["a", "d"]),
            task("c", &["b"]),
            task("d", &["c"]),
        ]);
        assert!(matches!(
            WorkflowValidator::new().validate(&wf),
            Err(ValidationError::CycleDetected(_))
        ));
    }
}
