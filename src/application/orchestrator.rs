//! Diagnostic orchestrator: the public face of the core.
//!
//! Owns nothing global: the capability executor, registries, oracle, and
//! progress sink arrive through the constructor and the caller controls
//! their lifecycle. Each run validates, schedules, executes, correlates,
//! and extracts a step summary from the accumulated trace before the report
//! is handed back to the caller.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, InvestigationContext, RoutingDecision, StepSummary, TraceEvent, TraceEventKind,
    TriageReport, WorkflowDefinition, WorkflowExecutionReport, WorkflowSummary,
};
use crate::domain::ports::{
    CapabilityExecutor, ProgressSink, ReasoningOracle, SpecialistRegistry, WorkflowRegistry,
};
use crate::services::correlator::ResultCorrelator;
use crate::services::phase_executor::{ExecutionEvent, PhaseExecutor};
use crate::services::progress_monitor::ProgressMonitor;
use crate::services::scheduler::DependencyScheduler;
use crate::services::trace_extractor::TraceExtractor;
use crate::services::triage_router::TriageRouter;
use crate::services::validator::WorkflowValidator;

/// Coordinates diagnostic investigations in both execution modes.
pub struct DiagnosticOrchestrator {
    workflow_registry: Arc<dyn WorkflowRegistry>,
    monitor: Arc<ProgressMonitor>,
    executor: Arc<PhaseExecutor>,
    router: TriageRouter,
    validator: WorkflowValidator,
    scheduler: DependencyScheduler,
    correlator: ResultCorrelator,
    extractor: TraceExtractor,
}

impl DiagnosticOrchestrator {
    pub fn new(
        workflow_registry: Arc<dyn WorkflowRegistry>,
        specialist_registry: Arc<dyn SpecialistRegistry>,
        capability_executor: Arc<dyn CapabilityExecutor>,
        oracle: Arc<dyn ReasoningOracle>,
        progress_sink: Arc<dyn ProgressSink>,
        config: Config,
    ) -> Self {
        let monitor = Arc::new(ProgressMonitor::new(progress_sink, config.monitor.clone()));
        let executor = Arc::new(PhaseExecutor::new(
            capability_executor,
            Arc::clone(&monitor),
            config.executor.clone(),
        ));
        let oracle_timeout = config.executor.per_task_timeout();
        let router = TriageRouter::new(
            specialist_registry,
            Arc::clone(&oracle),
            Arc::clone(&executor),
            config.triage.default_role.clone(),
            oracle_timeout,
        );

        Self {
            workflow_registry,
            monitor,
            executor,
            router,
            validator: WorkflowValidator::new(),
            scheduler: DependencyScheduler::new(),
            correlator: ResultCorrelator::new(oracle, oracle_timeout),
            extractor: TraceExtractor::new(),
        }
    }

    /// Summaries of every registered workflow.
    pub fn list_workflows(&self) -> Vec<WorkflowSummary> {
        self.workflow_registry.list()
    }

    /// Fetch one workflow definition.
    pub fn get_workflow(&self, workflow_id: &str) -> DomainResult<WorkflowDefinition> {
        self.workflow_registry
            .get(workflow_id)
            .ok_or_else(|| DomainError::WorkflowNotFound(workflow_id.to_string()))
    }

    /// Run a workflow in parallel (phased) mode.
    pub async fn run_workflow(
        &self,
        workflow_id: &str,
        context: &InvestigationContext,
    ) -> DomainResult<(WorkflowExecutionReport, StepSummary)> {
        let workflow = self.get_workflow(workflow_id)?;
        // Hard precondition: no execution before validation passes.
        self.validator.validate(&workflow)?;
        let phases = self.scheduler.schedule(&workflow.tasks)?;
        tracing::info!(
            workflow = workflow_id,
            tasks = workflow.tasks.len(),
            phases = phases.len(),
            "running workflow"
        );

        let _heartbeat = self.monitor.watch();
        let (event_tx, event_rx) = mpsc::channel(256);
        let collector = spawn_trace_collector(event_rx);

        let mut report = self
            .executor
            .execute_with_events(workflow_id, &workflow.tasks, &phases, context, event_tx)
            .await?;

        let mut kinds = collector
            .await
            .map_err(|err| DomainError::ExecutionFailed(err.to_string()))?;

        let payload = self.correlator.correlate(&workflow.tasks, &report.task_results);
        report.narrative = self.correlator.synthesize(&payload).await;
        kinds.push(TraceEventKind::Narrative { text: report.narrative.clone() });

        let summary = self.extractor.extract(&sequence(kinds));
        Ok((report, summary))
    }

    /// Run a free-form problem through triage routing.
    pub async fn run_triage(
        &self,
        problem_text: &str,
        context: &InvestigationContext,
    ) -> DomainResult<TriageReport> {
        let _heartbeat = self.monitor.watch();
        self.monitor.report(0, "triage started");

        let (event_tx, event_rx) = mpsc::channel(256);
        let collector = spawn_trace_collector(event_rx);

        let outcome = match self.router.run(problem_text, context, event_tx).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Routing errors abort before any specialist executes; drop
                // the collector with the channel.
                collector.abort();
                return Err(err);
            }
        };

        let execution_kinds = collector
            .await
            .map_err(|err| DomainError::ExecutionFailed(err.to_string()))?;

        let mut report = outcome.specialist_report;
        let specialist = self
            .router
            .lookup_profile(&outcome.routing_decision.to_role);
        let tasks = specialist.map(|p| p.tasks).unwrap_or_default();
        let payload = self.correlator.correlate(&tasks, &report.task_results);
        report.narrative = self.correlator.synthesize(&payload).await;

        // Deterministic trace order: handoff and activation first, then the
        // execution events, then the terminal transition and the narrative.
        let mut kinds: Vec<TraceEventKind> = Vec::new();
        let (head, tail) = outcome.audit_trail.split_at(outcome.audit_trail.len().saturating_sub(1));
        kinds.extend(head.iter().map(routing_kind));
        kinds.extend(execution_kinds);
        kinds.extend(tail.iter().map(routing_kind));
        kinds.push(TraceEventKind::Narrative { text: report.narrative.clone() });

        let step_summary = self.extractor.extract(&sequence(kinds));
        self.monitor.report(100, "triage finished");

        Ok(TriageReport {
            routing_decision: outcome.routing_decision,
            final_state: outcome.final_state,
            audit_trail: outcome.audit_trail,
            specialist_report: report,
            step_summary,
        })
    }
}

fn routing_kind(decision: &RoutingDecision) -> TraceEventKind {
    TraceEventKind::Routing {
        from_state: decision.from_state.clone(),
        to_role: decision.to_role.clone(),
        rationale: decision.rationale.clone(),
    }
}

/// Assign strictly increasing sequence indices in arrival order.
fn sequence(kinds: Vec<TraceEventKind>) -> Vec<TraceEvent> {
    kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| TraceEvent::new(i as u64, kind))
        .collect()
}

/// Fold execution events into trace event kinds as they arrive.
fn spawn_trace_collector(
    mut rx: mpsc::Receiver<ExecutionEvent>,
) -> JoinHandle<Vec<TraceEventKind>> {
    tokio::spawn(async move {
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ExecutionEvent::CapabilityInvoked { capability, arguments, .. } = event {
                kinds.push(TraceEventKind::ToolCall { capability, arguments });
            }
        }
        kinds
    })
}
