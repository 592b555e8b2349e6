//! Bounded-concurrency phase executor.
//!
//! Runs a scheduled workflow phase by phase. Within a phase every task is
//! launched concurrently and admission-controlled by a counting semaphore;
//! per-task failures and timeouts become `TaskResult`s and never abort
//! sibling tasks. A single global deadline covers the whole run: on expiry
//! the cancellation token is cancelled, in-flight tasks settle as `Timeout`,
//! unstarted tasks are recorded as `Skipped`, and the report degrades to
//! `Partial` with earlier results preserved unchanged.

use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    parallel_efficiency, ExecutionPhase, ExecutorConfig, InvestigationContext, OverallStatus,
    Task, TaskResult, TaskResultStatus, WorkflowExecutionReport,
};
use crate::domain::ports::{CapabilityError, CapabilityExecutor};
use crate::services::progress_monitor::ProgressMonitor;

/// Event emitted during execution.
///
/// The orchestrator folds these into the run's trace; CLI callers may also
/// subscribe for live display.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Execution started.
    Started { total_tasks: usize, phase_count: usize },
    /// Phase started.
    PhaseStarted { phase_index: usize, task_count: usize },
    /// Task started (permit acquired).
    TaskStarted { task_id: String, task_name: String },
    /// A capability was invoked on behalf of a task.
    CapabilityInvoked {
        task_id: String,
        capability: String,
        arguments: serde_json::Value,
    },
    /// Task settled (success, error, or timeout).
    TaskFinished { task_id: String, result: TaskResult },
    /// Phase completed; all of its tasks settled.
    PhaseCompleted { phase_index: usize, succeeded: usize, failed: usize },
    /// The global deadline elapsed with work remaining.
    DeadlineExceeded { skipped_tasks: usize },
    /// Execution finished.
    Completed { overall_status: OverallStatus },
}

/// Executes scheduled phases against a capability executor.
pub struct PhaseExecutor {
    capability_executor: Arc<dyn CapabilityExecutor>,
    monitor: Arc<ProgressMonitor>,
    config: ExecutorConfig,
}

impl PhaseExecutor {
    pub fn new(
        capability_executor: Arc<dyn CapabilityExecutor>,
        monitor: Arc<ProgressMonitor>,
        config: ExecutorConfig,
    ) -> Self {
        Self { capability_executor, monitor, config }
    }

    /// Execute phases without observing events.
    pub async fn execute(
        &self,
        workflow_id: &str,
        tasks: &[Task],
        phases: &[ExecutionPhase],
        context: &InvestigationContext,
    ) -> DomainResult<WorkflowExecutionReport> {
        let (tx, mut rx) = mpsc::channel(256);
        // Drain events so senders never block on an unread channel.
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        let report = self
            .execute_with_events(workflow_id, tasks, phases, context, tx)
            .await;
        drain.abort();
        report
    }

    /// Execute phases, streaming `ExecutionEvent`s to the given channel.
    pub async fn execute_with_events(
        &self,
        workflow_id: &str,
        tasks: &[Task],
        phases: &[ExecutionPhase],
        context: &InvestigationContext,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> DomainResult<WorkflowExecutionReport> {
        let started_at = Utc::now();
        let task_index: HashMap<&str, &Task> =
            tasks.iter().map(|t| (t.id.as_str(), t)).collect();

        let _ = event_tx
            .send(ExecutionEvent::Started {
                total_tasks: tasks.len(),
                phase_count: phases.len(),
            })
            .await;
        self.monitor.report(0, "execution started");

        // Deadline watcher cancels the token; every task observes it.
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            let deadline = self.config.global_deadline();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!(?deadline, "global deadline elapsed, cancelling run");
                cancel.cancel();
            })
        };

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_cap.max(1)));
        let mut results: BTreeMap<String, TaskResult> = BTreeMap::new();
        let mut phases_run = 0usize;
        let mut deadline_hit = false;

        for phase in phases {
            if cancel.is_cancelled() {
                deadline_hit = true;
                break;
            }

            let _ = event_tx
                .send(ExecutionEvent::PhaseStarted {
                    phase_index: phase.phase_index,
                    task_count: phase.task_ids.len(),
                })
                .await;
            tracing::info!(
                phase = phase.phase_index,
                tasks = phase.task_ids.len(),
                "phase started"
            );

            let mut handles = Vec::with_capacity(phase.task_ids.len());
            for task_id in &phase.task_ids {
                let Some(&task) = task_index.get(task_id.as_str()) else {
                    continue;
                };
                let task = task.clone();
                let executor = Arc::clone(&self.capability_executor);
                let semaphore = Arc::clone(&semaphore);
                let cancel = cancel.clone();
                let event_tx = event_tx.clone();
                let context = context.clone();
                let per_task_timeout = self.config.per_task_timeout();

                handles.push(tokio::spawn(async move {
                    run_task(task, executor, semaphore, cancel, event_tx, context, per_task_timeout)
                        .await
                }));
            }

            // The phase settles as a whole: later phases may read outputs
            // this one produced, so every launched task must finish first.
            let mut succeeded = 0usize;
            let mut failed = 0usize;
            for settled in join_all(handles).await {
                if let Ok(result) = settled {
                    match result.status {
                        TaskResultStatus::Success => succeeded += 1,
                        TaskResultStatus::Error => failed += 1,
                        TaskResultStatus::Timeout | TaskResultStatus::Skipped => {}
                    }
                    results.insert(result.task_id.clone(), result);
                }
            }

            phases_run += 1;
            let _ = event_tx
                .send(ExecutionEvent::PhaseCompleted {
                    phase_index: phase.phase_index,
                    succeeded,
                    failed,
                })
                .await;

            let settled = results.len();
            let percent = progress_percent(settled, tasks.len());
            self.monitor.report(
                percent,
                &format!("phase {} complete ({settled}/{} tasks settled)", phase.phase_index, tasks.len()),
            );
        }

        watcher.abort();
        deadline_hit = deadline_hit || cancel.is_cancelled();

        // Anything never launched is recorded as skipped, not silently lost.
        for task in tasks {
            if !results.contains_key(&task.id) {
                results.insert(task.id.clone(), TaskResult::skipped(&task.id));
            }
        }
        if deadline_hit {
            // Tasks cancelled while still queued also settled as skipped.
            let skipped = results
                .values()
                .filter(|r| r.status == TaskResultStatus::Skipped)
                .count();
            let _ = event_tx
                .send(ExecutionEvent::DeadlineExceeded { skipped_tasks: skipped })
                .await;
        }

        let overall_status = WorkflowExecutionReport::derive_status(&results, deadline_hit);
        let _ = event_tx
            .send(ExecutionEvent::Completed { overall_status })
            .await;
        self.monitor.report(100, "execution finished");

        Ok(WorkflowExecutionReport {
            run_id: Uuid::new_v4(),
            workflow_id: workflow_id.to_string(),
            phases_run,
            parallel_efficiency: parallel_efficiency(tasks.len(), phases.len()),
            task_results: results,
            overall_status,
            deadline_exceeded: deadline_hit,
            started_at,
            finished_at: Utc::now(),
            narrative: String::new(),
        })
    }
}

fn progress_percent(settled: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = settled * 100 / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Run one task: acquire a permit, invoke its capabilities in declared
/// order, settle as exactly one terminal `TaskResult`.
async fn run_task(
    task: Task,
    executor: Arc<dyn CapabilityExecutor>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<ExecutionEvent>,
    context: InvestigationContext,
    per_task_timeout: std::time::Duration,
) -> TaskResult {
    // Wait for admission. A task cancelled while still queued never started
    // any work, so it settles as skipped rather than timeout.
    let permit = tokio::select! {
        () = cancel.cancelled() => {
            return TaskResult::skipped(&task.id);
        }
        permit = semaphore.acquire_owned() => match permit {
            Ok(p) => p,
            Err(_) => return TaskResult::skipped(&task.id),
        },
    };
    let _permit = permit;

    let started_at = Utc::now();
    let _ = event_tx
        .send(ExecutionEvent::TaskStarted {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
        })
        .await;

    let work = invoke_capabilities(&task, &executor, &event_tx, &context, per_task_timeout);
    let outcome = tokio::select! {
        // The eventual result of a cancelled invocation is discarded.
        () = cancel.cancelled() => Err(CancelOrTimeout::Deadline),
        res = timeout(per_task_timeout, work) => match res {
            Ok(inner) => inner.map_err(CancelOrTimeout::Capability),
            Err(_) => Err(CancelOrTimeout::PerTask),
        },
    };

    let finished_at = Utc::now();
    let result = match outcome {
        Ok(output) => TaskResult {
            task_id: task.id.clone(),
            status: TaskResultStatus::Success,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
            output,
            error_message: None,
        },
        Err(CancelOrTimeout::Capability(err)) => {
            tracing::debug!(task = %task.id, error = %err, "task errored");
            TaskResult {
                task_id: task.id.clone(),
                status: TaskResultStatus::Error,
                started_at: Some(started_at),
                finished_at: Some(finished_at),
                output: serde_json::Value::Null,
                error_message: Some(err.to_string()),
            }
        }
        Err(CancelOrTimeout::PerTask) => TaskResult {
            task_id: task.id.clone(),
            status: TaskResultStatus::Timeout,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
            output: serde_json::Value::Null,
            error_message: Some(format!(
                "task timed out after {} seconds",
                per_task_timeout.as_secs()
            )),
        },
        Err(CancelOrTimeout::Deadline) => TaskResult {
            task_id: task.id.clone(),
            status: TaskResultStatus::Timeout,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
            output: serde_json::Value::Null,
            error_message: Some("cancelled: global deadline exceeded".to_string()),
        },
    };

    let _ = event_tx
        .send(ExecutionEvent::TaskFinished {
            task_id: task.id.clone(),
            result: result.clone(),
        })
        .await;

    result
}

enum CancelOrTimeout {
    Capability(CapabilityError),
    PerTask,
    Deadline,
}

/// Invoke the task's capabilities sequentially; first failure fails the task.
async fn invoke_capabilities(
    task: &Task,
    executor: &Arc<dyn CapabilityExecutor>,
    event_tx: &mpsc::Sender<ExecutionEvent>,
    context: &InvestigationContext,
    per_call_timeout: std::time::Duration,
) -> Result<serde_json::Value, CapabilityError> {
    let mut outputs = serde_json::Map::new();

    for capability in &task.required_capabilities {
        let arguments = build_arguments(task, context);
        let _ = event_tx
            .send(ExecutionEvent::CapabilityInvoked {
                task_id: task.id.clone(),
                capability: capability.clone(),
                arguments: arguments.clone(),
            })
            .await;

        let result = executor.invoke(capability, arguments, per_call_timeout).await?;
        outputs.insert(capability.clone(), result.output);
    }

    Ok(serde_json::Value::Object(outputs))
}

/// Arguments handed to the capability executor: the task's instructions plus
/// the context keys the task declared it needs.
fn build_arguments(task: &Task, context: &InvestigationContext) -> serde_json::Value {
    let mut args = serde_json::Map::new();
    args.insert("instructions".to_string(), task.instructions.clone().into());

    let mut ctx = serde_json::Map::new();
    for key in &task.context_requirements {
        match key.as_str() {
            "time_window" => {
                if let Some(window) = &context.time_window {
                    ctx.insert(key.clone(), window.clone().into());
                }
            }
            "prior_findings" => {
                ctx.insert(key.clone(), context.prior_findings.clone().into());
            }
            other => {
                if let Some(value) = context.focus_filters.get(other) {
                    ctx.insert(key.clone(), value.clone().into());
                }
            }
        }
    }
    if !ctx.is_empty() {
        args.insert("context".to_string(), serde_json::Value::Object(ctx));
    }

    serde_json::Value::Object(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::capability::scripted::{ScriptedCapabilityExecutor, ScriptedResponse};
    use crate::domain::models::MonitorConfig;
    use crate::domain::ports::NullProgressSink;
    use crate::services::scheduler::DependencyScheduler;

    fn executor_with(script: ScriptedCapabilityExecutor, config: ExecutorConfig) -> PhaseExecutor {
        let monitor = Arc::new(ProgressMonitor::new(
            Arc::new(NullProgressSink),
            MonitorConfig::default(),
        ));
        PhaseExecutor::new(Arc::new(script), monitor, config)
    }

    fn task(id: &str, capability: &str, deps: &[&str]) -> Task {
        Task::new(id, id)
            .with_capabilities([capability])
            .with_dependencies(deps.iter().copied())
    }

    fn schedule(tasks: &[Task]) -> Vec<ExecutionPhase> {
        DependencyScheduler::new().schedule(tasks).unwrap()
    }

    #[tokio::test]
    async fn empty_workflow_completes() {
        let exec = executor_with(ScriptedCapabilityExecutor::new(), ExecutorConfig::default());
        let report = exec
            .execute("wf", &[], &[], &InvestigationContext::default())
            .await
            .unwrap();
        assert_eq!(report.overall_status, OverallStatus::Complete);
        assert_eq!(report.phases_run, 0);
    }

    #[tokio::test]
    async fn sibling_tasks_survive_one_error() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response("ok_cap", ScriptedResponse::success(serde_json::json!("fine")));
        script.set_response("bad_cap", ScriptedResponse::failure("boom"));

        let tasks = vec![
            task("a", "ok_cap", &[]),
            task("b", "bad_cap", &[]),
            task("c", "ok_cap", &[]),
        ];
        let phases = schedule(&tasks);
        let exec = executor_with(script, ExecutorConfig::default());
        let report = exec
            .execute("wf", &tasks, &phases, &InvestigationContext::default())
            .await
            .unwrap();

        assert_eq!(report.task_results["a"].status, TaskResultStatus::Success);
        assert_eq!(report.task_results["b"].status, TaskResultStatus::Error);
        assert_eq!(report.task_results["c"].status, TaskResultStatus::Success);
        assert_eq!(report.overall_status, OverallStatus::Complete);
    }

    #[tokio::test]
    async fn per_task_timeout_settles_as_timeout() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response(
            "slow_cap",
            ScriptedResponse::success(serde_json::json!("late"))
                .with_latency(std::time::Duration::from_secs(5)),
        );
        script.set_response("fast_cap", ScriptedResponse::success(serde_json::json!("ok")));

        let tasks = vec![task("slow", "slow_cap", &[]), task("fast", "fast_cap", &[])];
        let phases = schedule(&tasks);
        let config = ExecutorConfig {
            per_task_timeout_secs: 1,
            ..ExecutorConfig::default()
        };
        let exec = executor_with(script, config);
        let report = exec
            .execute("wf", &tasks, &phases, &InvestigationContext::default())
            .await
            .unwrap();

        assert_eq!(report.task_results["slow"].status, TaskResultStatus::Timeout);
        assert_eq!(report.task_results["fast"].status, TaskResultStatus::Success);
        // An isolated per-task timeout is not a deadline cut-off.
        assert_eq!(report.overall_status, OverallStatus::Complete);
        assert!(!report.deadline_exceeded);
    }

    #[tokio::test]
    async fn global_deadline_marks_unstarted_tasks_skipped() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response(
            "slow_cap",
            ScriptedResponse::success(serde_json::json!("late"))
                .with_latency(std::time::Duration::from_secs(10)),
        );
        script.set_response("fast_cap", ScriptedResponse::success(serde_json::json!("ok")));

        // fast runs in phase 0; slow in phase 1; blocked never starts.
        let tasks = vec![
            task("fast", "fast_cap", &[]),
            task("slow", "slow_cap", &["fast"]),
            task("blocked", "fast_cap", &["slow"]),
        ];
        let phases = schedule(&tasks);
        let config = ExecutorConfig {
            per_task_timeout_secs: 60,
            global_deadline_secs: 1,
            ..ExecutorConfig::default()
        };
        let exec = executor_with(script, config);
        let report = exec
            .execute("wf", &tasks, &phases, &InvestigationContext::default())
            .await
            .unwrap();

        assert_eq!(report.overall_status, OverallStatus::Partial);
        assert_eq!(report.task_results["fast"].status, TaskResultStatus::Success);
        assert_eq!(report.task_results["slow"].status, TaskResultStatus::Timeout);
        assert_eq!(report.task_results["blocked"].status, TaskResultStatus::Skipped);
    }

    #[tokio::test]
    async fn deadline_event_counts_queued_and_unstarted_skips() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response(
            "slow_cap",
            ScriptedResponse::success(serde_json::json!("late"))
                .with_latency(std::time::Duration::from_secs(10)),
        );

        // Cap 1: one sibling holds the permit past the deadline while the
        // other is still queued; the dependent never launches at all.
        let tasks = vec![
            task("holder", "slow_cap", &[]),
            task("waiter", "slow_cap", &[]),
            task("blocked", "slow_cap", &["holder"]),
        ];
        let phases = schedule(&tasks);
        let config = ExecutorConfig {
            concurrency_cap: 1,
            per_task_timeout_secs: 60,
            global_deadline_secs: 1,
        };
        let exec = executor_with(script, config);

        let (tx, mut rx) = mpsc::channel(64);
        let report = exec
            .execute_with_events("wf", &tasks, &phases, &InvestigationContext::default(), tx)
            .await
            .unwrap();

        let skipped_in_report = report
            .task_results
            .values()
            .filter(|r| r.status == TaskResultStatus::Skipped)
            .count();
        assert_eq!(skipped_in_report, 2);

        let mut reported = None;
        while let Some(event) = rx.recv().await {
            if let ExecutionEvent::DeadlineExceeded { skipped_tasks } = event {
                reported = Some(skipped_tasks);
            }
        }
        assert_eq!(reported, Some(skipped_in_report));
    }

    #[tokio::test]
    async fn concurrency_cap_is_respected() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response(
            "probe",
            ScriptedResponse::success(serde_json::json!("ok"))
                .with_latency(std::time::Duration::from_millis(50)),
        );

        let tasks: Vec<Task> = (0..5).map(|i| task(&format!("t{i}"), "probe", &[])).collect();
        let phases = schedule(&tasks);
        assert_eq!(phases.len(), 1);

        let config = ExecutorConfig { concurrency_cap: 2, ..ExecutorConfig::default() };
        let gauge = script.concurrency_gauge();
        let exec = executor_with(script, config);
        let report = exec
            .execute("wf", &tasks, &phases, &InvestigationContext::default())
            .await
            .unwrap();

        assert_eq!(report.succeeded_count(), 5);
        assert!(gauge.peak() <= 2, "peak concurrency {} exceeded cap", gauge.peak());
    }

    #[tokio::test]
    async fn events_carry_capability_invocations() {
        let script = ScriptedCapabilityExecutor::new();
        script.set_response("probe", ScriptedResponse::success(serde_json::json!("ok")));
        let tasks = vec![task("a", "probe", &[])];
        let phases = schedule(&tasks);
        let exec = executor_with(script, ExecutorConfig::default());

        let (tx, mut rx) = mpsc::channel(64);
        let report = exec
            .execute_with_events("wf", &tasks, &phases, &InvestigationContext::default(), tx)
            .await
            .unwrap();
        assert_eq!(report.overall_status, OverallStatus::Complete);

        let mut saw_invocation = false;
        while let Some(event) = rx.recv().await {
            if let ExecutionEvent::CapabilityInvoked { capability, .. } = event {
                assert_eq!(capability, "probe");
                saw_invocation = true;
            }
        }
        assert!(saw_invocation);
    }
}
