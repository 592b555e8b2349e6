//! Ports (interfaces) to external collaborators.
//!
//! All four are injected into the orchestration core by the caller; the
//! core holds no global registries.

pub mod capability;
pub mod oracle;
pub mod progress;
pub mod registry;

pub use capability::{CapabilityError, CapabilityExecutor, CapabilityResult};
pub use oracle::{OracleError, ReasoningOracle};
pub use progress::{NullProgressSink, ProgressSink};
pub use registry::{SpecialistRegistry, WorkflowRegistry};
