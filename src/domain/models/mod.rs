//! Domain models for the sleuth orchestration core.

pub mod config;
pub mod specialist;
pub mod task;
pub mod trace;
pub mod workflow;

pub use config::{Config, DefinitionsConfig, ExecutorConfig, LoggingConfig, MonitorConfig, TriageConfig};
pub use specialist::{RoutingDecision, SpecialistProfile, TriageReport, TriageState};
pub use task::{Task, TaskResult, TaskResultStatus};
pub use trace::{
    DetectionMethod, StepSummary, TimelineEntry, TimelineEntryKind, ToolExecution, TraceEvent,
    TraceEventKind,
};
pub use workflow::{
    parallel_efficiency, ExecutionPhase, InvestigationContext, OverallStatus,
    WorkflowDefinition, WorkflowExecutionReport, WorkflowSummary,
};
