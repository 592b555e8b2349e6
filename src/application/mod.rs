//! Application layer: use-case orchestration.

pub mod orchestrator;

pub use orchestrator::DiagnosticOrchestrator;
