//! Adapters: concrete implementations of the domain ports.

pub mod capability;
pub mod progress;
pub mod registry;

pub use capability::{ScriptedCapabilityExecutor, ScriptedOracle, ScriptedResponse};
pub use progress::{ChannelProgressSink, IndicatifProgressSink};
pub use registry::{InMemorySpecialistRegistry, InMemoryWorkflowRegistry};
