//! Services: the orchestration core's business logic.

pub mod correlator;
pub mod phase_executor;
pub mod progress_monitor;
pub mod scheduler;
pub mod trace_extractor;
pub mod triage_router;
pub mod validator;

pub use correlator::{CorrelatedPayload, ResultCorrelator};
pub use phase_executor::{ExecutionEvent, PhaseExecutor};
pub use progress_monitor::{HeartbeatGuard, ProgressMonitor};
pub use scheduler::DependencyScheduler;
pub use trace_extractor::TraceExtractor;
pub use triage_router::{TriageOutcome, TriageRouter};
pub use validator::WorkflowValidator;
