//! End-to-end orchestrator tests: validate, schedule, execute, correlate,
//! and extract a structured digest, all against scripted adapters.

use std::sync::Arc;

use sleuth::adapters::{
    InMemorySpecialistRegistry, InMemoryWorkflowRegistry, ScriptedCapabilityExecutor,
    ScriptedOracle, ScriptedResponse,
};
use sleuth::application::DiagnosticOrchestrator;
use sleuth::domain::errors::{DomainError, ValidationError};
use sleuth::domain::models::{
    Config, InvestigationContext, OverallStatus, Task, TaskResultStatus, WorkflowDefinition,
};
use sleuth::domain::ports::NullProgressSink;

fn diamond_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "checkout-latency",
        "Checkout latency investigation",
        vec![
            Task::new("fetch", "Fetch baseline")
                .with_instructions("Pull the service topology.")
                .with_capabilities(["topology_lookup"]),
            Task::new("logs", "Analyze logs")
                .with_capabilities(["log_search"])
                .with_dependencies(["fetch"]),
            Task::new("metrics", "Analyze metrics")
                .with_capabilities(["metric_query"])
                .with_dependencies(["fetch"]),
            Task::new("summarize", "Summarize")
                .with_capabilities(["report_builder"])
                .with_dependencies(["logs", "metrics"]),
        ],
    )
}

fn orchestrator_for(
    workflow: WorkflowDefinition,
    script: ScriptedCapabilityExecutor,
    oracle: ScriptedOracle,
) -> DiagnosticOrchestrator {
    DiagnosticOrchestrator::new(
        Arc::new(InMemoryWorkflowRegistry::new(vec![workflow])),
        Arc::new(InMemorySpecialistRegistry::new(Vec::new())),
        Arc::new(script),
        Arc::new(oracle),
        Arc::new(NullProgressSink),
        Config::default(),
    )
}

fn scripted_success(capabilities: &[&str]) -> ScriptedCapabilityExecutor {
    let script = ScriptedCapabilityExecutor::new();
    for capability in capabilities {
        script.set_response(
            *capability,
            ScriptedResponse::success(serde_json::json!({"rows": 3})),
        );
    }
    script
}

#[tokio::test]
async fn diamond_workflow_completes_with_narrative_and_digest() {
    let script = scripted_success(&[
        "topology_lookup",
        "log_search",
        "metric_query",
        "report_builder",
    ]);
    let oracle = ScriptedOracle::new()
        .with_narrative("Root cause: connection pool exhaustion. We recommend raising the pool size.");
    let orchestrator = orchestrator_for(diamond_workflow(), script, oracle);

    let (report, summary) = orchestrator
        .run_workflow("checkout-latency", &InvestigationContext::default())
        .await
        .expect("run succeeds");

    assert_eq!(report.overall_status, OverallStatus::Complete);
    assert!(!report.deadline_exceeded);
    assert_eq!(report.phases_run, 3);
    assert_eq!(report.task_results.len(), 4);
    assert!(report
        .task_results
        .values()
        .all(|r| r.status == TaskResultStatus::Success));
    // 4 tasks in 3 phases: 1 - (3-1)/(4-1)
    assert!((report.parallel_efficiency - (1.0 - 2.0 / 3.0)).abs() < 1e-9);
    assert!(report.narrative.contains("connection pool exhaustion"));

    // Every invoked capability shows up in the digest exactly once.
    let tools: Vec<&str> = summary
        .tools_executed
        .iter()
        .map(|t| t.capability.as_str())
        .collect();
    for capability in ["topology_lookup", "log_search", "metric_query", "report_builder"] {
        assert_eq!(tools.iter().filter(|t| **t == capability).count(), 1);
    }
    assert!(!summary.timeline.is_empty());
    assert!(summary
        .key_findings
        .iter()
        .any(|f| f.contains("Root cause")));
}

#[tokio::test]
async fn failed_capability_marks_task_error_without_stopping_dependents() {
    let script = scripted_success(&[
        "topology_lookup",
        "metric_query",
        "report_builder",
    ]);
    script.set_response("log_search", ScriptedResponse::failure("index unreachable"));
    let orchestrator = orchestrator_for(diamond_workflow(), script, ScriptedOracle::new());

    let (report, _summary) = orchestrator
        .run_workflow("checkout-latency", &InvestigationContext::default())
        .await
        .expect("run settles per-task failures");

    assert_eq!(report.task_results["logs"].status, TaskResultStatus::Error);
    assert!(report.task_results["logs"]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("index unreachable"));
    // Siblings and dependents still ran.
    assert_eq!(report.task_results["metrics"].status, TaskResultStatus::Success);
    assert_eq!(report.task_results["summarize"].status, TaskResultStatus::Success);
    assert_eq!(report.overall_status, OverallStatus::Complete);
}

#[tokio::test]
async fn all_tasks_failing_yields_failed_status() {
    let script = ScriptedCapabilityExecutor::new();
    for capability in ["topology_lookup", "log_search", "metric_query", "report_builder"] {
        script.set_response(capability, ScriptedResponse::failure("backend down"));
    }
    let orchestrator = orchestrator_for(diamond_workflow(), script, ScriptedOracle::new());

    let (report, _) = orchestrator
        .run_workflow("checkout-latency", &InvestigationContext::default())
        .await
        .expect("run settles");

    assert_eq!(report.overall_status, OverallStatus::Failed);
    assert_eq!(report.failed_count(), 4);
}

#[tokio::test]
async fn synthesis_failure_falls_back_to_structured_payload() {
    let script = scripted_success(&[
        "topology_lookup",
        "log_search",
        "metric_query",
        "report_builder",
    ]);
    let orchestrator = orchestrator_for(
        diamond_workflow(),
        script,
        ScriptedOracle::new().failing_synthesis(),
    );

    let (report, _) = orchestrator
        .run_workflow("checkout-latency", &InvestigationContext::default())
        .await
        .expect("run succeeds despite oracle outage");

    assert_eq!(report.overall_status, OverallStatus::Complete);
    assert!(report.narrative.contains("capability_groups"));
}

#[tokio::test]
async fn unknown_workflow_is_reported() {
    let orchestrator = orchestrator_for(
        diamond_workflow(),
        ScriptedCapabilityExecutor::new(),
        ScriptedOracle::new(),
    );

    let err = orchestrator
        .run_workflow("missing", &InvestigationContext::default())
        .await
        .expect_err("unknown id must fail");
    assert!(matches!(err, DomainError::WorkflowNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn invalid_workflow_never_executes() {
    let workflow = WorkflowDefinition::new(
        "broken",
        "Broken workflow",
        vec![Task::new("a", "A").with_dependencies(["ghost"])],
    );
    let script = ScriptedCapabilityExecutor::new();
    let orchestrator = orchestrator_for(workflow, script, ScriptedOracle::new());

    let err = orchestrator
        .run_workflow("broken", &InvestigationContext::default())
        .await
        .expect_err("validation must fail");
    match err {
        DomainError::Validation(ValidationError::UnknownDependency {
            task_id,
            dependency_id,
        }) => {
            assert_eq!(task_id, "a");
            assert_eq!(dependency_id, "ghost");
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
}
