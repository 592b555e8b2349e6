//! Sleuth - Diagnostic Workflow Orchestrator
//!
//! Sleuth runs diagnostic investigations as dependency-ordered workflows:
//! tasks are validated, scheduled into parallel phases, executed against
//! pluggable capability backends under timeout and deadline control, and
//! their outputs correlated into a single investigation report. A triage
//! router can also take a free-form problem description and hand it off to
//! the best-matching specialist workflow.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors, and port traits
//! - **Service Layer** (`services`): Validation, scheduling, execution, triage
//! - **Application Layer** (`application`): Use case orchestration
//! - **Adapters Layer** (`adapters`): Port implementations (scripted, in-memory)
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use sleuth::application::DiagnosticOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire registries, a capability executor, and an oracle, then
//!     // run_workflow or run_triage.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::DiagnosticOrchestrator;
pub use domain::errors::{DomainError, DomainResult, RoutingError, ValidationError};
pub use domain::models::{
    Config, ExecutionPhase, InvestigationContext, OverallStatus, SpecialistProfile, StepSummary,
    Task, TaskResult, TaskResultStatus, TriageReport, TriageState, WorkflowDefinition,
    WorkflowExecutionReport,
};
pub use domain::ports::{
    CapabilityExecutor, ProgressSink, ReasoningOracle, SpecialistRegistry, WorkflowRegistry,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    DependencyScheduler, PhaseExecutor, ProgressMonitor, ResultCorrelator, TraceExtractor,
    TriageRouter, WorkflowValidator,
};
