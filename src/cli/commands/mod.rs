//! CLI command implementations.

pub mod render;
pub mod triage;
pub mod workflow;
