//! Dependency scheduler: levels a validated task set into execution phases.
//!
//! Leveled Kahn's algorithm: repeatedly peel the set of tasks with in-degree
//! zero as the next phase, then decrement the in-degree of their dependents.
//! Each phase therefore contains only tasks whose dependencies resolved in
//! strictly earlier phases.

use std::collections::HashMap;

use crate::domain::errors::ValidationError;
use crate::domain::models::{ExecutionPhase, Task};

/// Computes phase schedules over validated task sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyScheduler;

impl DependencyScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Compute ordered execution phases for a task set.
    ///
    /// Expects a set that already passed validation; a cycle surviving to
    /// this point still surfaces as `CycleDetected` rather than a wrong
    /// schedule.
    pub fn schedule(&self, tasks: &[Task]) -> Result<Vec<ExecutionPhase>, ValidationError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for task in tasks {
            in_degree.entry(&task.id).or_insert(0);
            for dep in &task.dependencies {
                dependents.entry(dep.as_str()).or_default().push(&task.id);
                *in_degree.entry(&task.id).or_insert(0) += 1;
            }
        }

        let mut phases = Vec::new();
        let mut scheduled = 0usize;

        // Peel level by level; iterate the original task slice each round so
        // phase membership follows declaration order deterministically.
        let mut ready: Vec<&str> = tasks
            .iter()
            .filter(|t| in_degree[t.id.as_str()] == 0)
            .map(|t| t.id.as_str())
            .collect();

        while !ready.is_empty() {
            let phase_index = phases.len();
            let mut next_ready = Vec::new();

            for &id in &ready {
                if let Some(children) = dependents.get(id) {
                    for &child in children {
                        if let Some(degree) = in_degree.get_mut(child) {
                            *degree -= 1;
                            if *degree == 0 {
                                next_ready.push(child);
                            }
                        }
                    }
                }
            }

            scheduled += ready.len();
            phases.push(ExecutionPhase {
                phase_index,
                task_ids: ready.iter().map(|&id| id.to_string()).collect(),
            });

            // Preserve declaration order within the next phase.
            next_ready.sort_by_key(|&id| {
                tasks.iter().position(|t| t.id == id).unwrap_or(usize::MAX)
            });
            ready = next_ready;
        }

        if scheduled != tasks.len() {
            // Remaining tasks all sit on a cycle.
            let stuck: Vec<String> = tasks
                .iter()
                .filter(|t| in_degree[t.id.as_str()] > 0)
                .map(|t| t.id.clone())
                .collect();
            return Err(ValidationError::CycleDetected(stuck));
        }

        Ok(phases)
    }
}
