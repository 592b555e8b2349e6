//! Progress sink port - caller-supplied progress reporting.

/// Receives progress events from the orchestration core.
///
/// Implemented by the CLI (progress bar), tests (channel), or any transport
/// layer. Calls must be cheap and non-blocking; the core invokes `report`
/// from phase boundaries and from the liveness monitor's background ticker.
pub trait ProgressSink: Send + Sync {
    /// Report progress. `percent` is 0-100.
    fn report(&self, percent: u8, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _percent: u8, _message: &str) {}
}
