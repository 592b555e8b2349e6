//! Capability-side adapters: scripted executor and oracle.

pub mod oracle;
pub mod scripted;

pub use oracle::ScriptedOracle;
pub use scripted::{ConcurrencyGauge, ScriptedCapabilityExecutor, ScriptedResponse};
