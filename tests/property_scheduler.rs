use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;

use sleuth::domain::errors::ValidationError;
use sleuth::domain::models::Task;
use sleuth::services::DependencyScheduler;

fn chain_with_skips(size: usize) -> Vec<Task> {
    // Every even task depends on the previous task; odd tasks are free.
    (0..size)
        .map(|i| {
            let task = Task::new(format!("t{i}"), format!("Task {i}"));
            if i > 0 && i % 2 == 0 {
                task.with_dependencies([format!("t{}", i - 1)])
            } else {
                task
            }
        })
        .collect()
}

proptest! {
    /// Property: every dependency lands in a strictly earlier phase.
    #[test]
    fn prop_dependencies_precede_dependents(size in 1usize..32) {
        let scheduler = DependencyScheduler::new();
        let tasks = chain_with_skips(size);
        let phases = scheduler.schedule(&tasks).unwrap();

        let mut phase_of: HashMap<&str, usize> = HashMap::new();
        for phase in &phases {
            for task_id in &phase.task_ids {
                phase_of.insert(task_id.as_str(), phase.phase_index);
            }
        }

        for task in &tasks {
            for dep in &task.dependencies {
                prop_assert!(phase_of[dep.as_str()] < phase_of[task.id.as_str()]);
            }
        }
    }

    /// Property: phases partition the task set, each task exactly once.
    #[test]
    fn prop_phases_partition_tasks(size in 1usize..32) {
        let scheduler = DependencyScheduler::new();
        let tasks = chain_with_skips(size);
        let phases = scheduler.schedule(&tasks).unwrap();

        let mut seen: Vec<&str> = phases
            .iter()
            .flat_map(|p| p.task_ids.iter().map(String::as_str))
            .collect();
        prop_assert_eq!(seen.len(), size);
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), size);
    }

    /// Property: phase indexes are contiguous from zero.
    #[test]
    fn prop_phase_indexes_contiguous(size in 1usize..32) {
        let scheduler = DependencyScheduler::new();
        let phases = scheduler.schedule(&chain_with_skips(size)).unwrap();
        for (expected, phase) in phases.iter().enumerate() {
            prop_assert_eq!(phase.phase_index, expected);
            prop_assert!(!phase.task_ids.is_empty());
        }
    }

    /// Property: a ring of any length is always rejected as a cycle.
    #[test]
    fn prop_rings_are_rejected(size in 2usize..16) {
        let scheduler = DependencyScheduler::new();
        let tasks: Vec<Task> = (0..size)
            .map(|i| {
                Task::new(format!("t{i}"), format!("Task {i}"))
                    .with_dependencies([format!("t{}", (i + 1) % size)])
            })
            .collect();

        match scheduler.schedule(&tasks) {
            Err(ValidationError::CycleDetected(path)) => prop_assert!(!path.is_empty()),
            other => return Err(TestCaseError::fail(format!("expected cycle, got {other:?}"))),
        }
    }
}
