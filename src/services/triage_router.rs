//! Triage router and handoff state machine.
//!
//! Single-path mode: one free-form problem description is classified by the
//! external oracle, validated against the specialist registry, and handed
//! off to exactly one specialist track, whose own task list runs on the
//! shared scheduler and phase executor. Every transition is appended to an
//! immutable audit trail. No role is entered twice in one run, and an
//! unknown role from the classifier is a hard error, never a guess.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainResult, RoutingError};
use crate::domain::models::{
    InvestigationContext, OverallStatus, RoutingDecision, SpecialistProfile, TriageState,
    WorkflowExecutionReport,
};
use crate::domain::ports::{ReasoningOracle, SpecialistRegistry};
use crate::services::phase_executor::{ExecutionEvent, PhaseExecutor};
use crate::services::scheduler::DependencyScheduler;
use crate::services::validator::WorkflowValidator;

/// Outcome of one triage run, before summary extraction.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub final_state: TriageState,
    /// The handoff record (first entry of the audit trail).
    pub routing_decision: RoutingDecision,
    pub audit_trail: Vec<RoutingDecision>,
    pub specialist_report: WorkflowExecutionReport,
}

/// Routes a problem to one specialist and runs its execution track.
pub struct TriageRouter {
    registry: Arc<dyn SpecialistRegistry>,
    oracle: Arc<dyn ReasoningOracle>,
    executor: Arc<PhaseExecutor>,
    validator: WorkflowValidator,
    scheduler: DependencyScheduler,
    /// Used only when the classifier returns a blank role.
    default_role: Option<String>,
    oracle_timeout: Duration,
}

impl TriageRouter {
    pub fn new(
        registry: Arc<dyn SpecialistRegistry>,
        oracle: Arc<dyn ReasoningOracle>,
        executor: Arc<PhaseExecutor>,
        default_role: Option<String>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            oracle,
            executor,
            validator: WorkflowValidator::new(),
            scheduler: DependencyScheduler::new(),
            default_role,
            oracle_timeout,
        }
    }

    /// Run the full triage state machine for one problem.
    ///
    /// Execution events from the specialist's run are forwarded to
    /// `event_tx`; routing transitions are recorded in the returned audit
    /// trail. Routing failures surface before any specialist task executes.
    pub async fn run(
        &self,
        problem_text: &str,
        context: &InvestigationContext,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> DomainResult<TriageOutcome> {
        let mut state = TriageState::Init;
        let mut audit_trail: Vec<RoutingDecision> = Vec::new();
        let mut entered_roles: Vec<String> = Vec::new();

        // Init -> Routed: classification is the oracle's opaque decision;
        // the router only validates it.
        let profiles = self.registry.profiles();
        if profiles.is_empty() {
            return Err(RoutingError::NoRouteSelected("no specialists configured".to_string()).into());
        }

        let specialist = self.classify(problem_text, &profiles).await?;
        let role = specialist.role_name.clone();
        if entered_roles.contains(&role) {
            return Err(RoutingError::RoleAlreadyEntered(role).into());
        }
        entered_roles.push(role.clone());

        let handoff = RoutingDecision {
            from_state: state.name().to_string(),
            to_role: role.clone(),
            rationale: format!("classified problem: {problem_text}"),
            timestamp: Utc::now(),
        };
        audit_trail.push(handoff.clone());
        state = TriageState::Routed { role: role.clone() };
        tracing::info!(role = %role, "triage routed");

        // Routed -> SpecialistActive: the specialist's own task list runs on
        // the shared machinery; the accumulated context transfers unmodified.
        self.validator.validate_tasks(&specialist.tasks)?;
        let phases = self.scheduler.schedule(&specialist.tasks)?;

        audit_trail.push(RoutingDecision {
            from_state: state.name().to_string(),
            to_role: role.clone(),
            rationale: "specialist execution started".to_string(),
            timestamp: Utc::now(),
        });
        state = TriageState::SpecialistActive { role: role.clone() };

        let report = self
            .executor
            .execute_with_events(
                &format!("triage:{role}"),
                &specialist.tasks,
                &phases,
                context,
                event_tx,
            )
            .await?;

        // SpecialistActive -> Complete | Failed. Failed only when the run
        // exhausted the global deadline or every task errored; isolated
        // task failures still complete the triage.
        let failure_reason = if report.deadline_exceeded {
            Some("global deadline exhausted".to_string())
        } else if report.overall_status == OverallStatus::Failed {
            Some("every specialist task errored".to_string())
        } else {
            None
        };

        state = match failure_reason {
            Some(reason) => {
                tracing::warn!(role = %role, reason = %reason, "triage failed");
                audit_trail.push(RoutingDecision {
                    from_state: state.name().to_string(),
                    to_role: role.clone(),
                    rationale: format!("failed: {reason}"),
                    timestamp: Utc::now(),
                });
                TriageState::Failed { role: role.clone(), reason }
            }
            None => {
                audit_trail.push(RoutingDecision {
                    from_state: state.name().to_string(),
                    to_role: role.clone(),
                    rationale: "specialist completed".to_string(),
                    timestamp: Utc::now(),
                });
                TriageState::Complete { role: role.clone() }
            }
        };

        Ok(TriageOutcome {
            final_state: state,
            routing_decision: handoff,
            audit_trail,
            specialist_report: report,
        })
    }

    /// Fetch a profile from the configured registry.
    pub fn lookup_profile(&self, role_name: &str) -> Option<SpecialistProfile> {
        self.registry.lookup(role_name)
    }

    /// Ask the oracle for a role and validate it against the registry.
    async fn classify(
        &self,
        problem_text: &str,
        profiles: &[SpecialistProfile],
    ) -> Result<SpecialistProfile, RoutingError> {
        let selected = tokio::time::timeout(
            self.oracle_timeout,
            self.oracle.classify(problem_text, profiles),
        )
        .await
        .map_err(|_| RoutingError::NoRouteSelected("classifier timed out".to_string()))?
        .map_err(|err| RoutingError::NoRouteSelected(err.to_string()))?;

        let selected = selected.trim();
        let role = if selected.is_empty() {
            self.default_role
                .clone()
                .ok_or_else(|| RoutingError::NoRouteSelected("classifier returned no role".to_string()))?
        } else {
            selected.to_string()
        };

        self.registry
            .lookup(&role)
            .ok_or(RoutingError::UnknownRole(role))
    }
}
