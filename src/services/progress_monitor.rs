//! Progress and liveness monitor.
//!
//! Wraps a caller-supplied `ProgressSink`. Explicit reports are forwarded
//! immediately; a background heartbeat re-emits the last report on a fixed
//! cadence while an operation is blocked in an external call, and a
//! staleness threshold escalates to a warning-level event so callers can
//! distinguish "slow" from "stalled". Staleness is a warning, never a
//! failure.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::domain::models::MonitorConfig;
use crate::domain::ports::ProgressSink;

#[derive(Debug, Clone)]
struct LastReport {
    at: Instant,
    percent: u8,
    message: String,
}

/// Forwards progress to a sink and tracks liveness.
pub struct ProgressMonitor {
    sink: Arc<dyn ProgressSink>,
    config: MonitorConfig,
    last: Arc<Mutex<LastReport>>,
}

impl ProgressMonitor {
    pub fn new(sink: Arc<dyn ProgressSink>, config: MonitorConfig) -> Self {
        Self {
            sink,
            config,
            last: Arc::new(Mutex::new(LastReport {
                at: Instant::now(),
                percent: 0,
                message: String::new(),
            })),
        }
    }

    /// Forward a progress event and reset the staleness clock.
    pub fn report(&self, percent: u8, message: &str) {
        if let Ok(mut last) = self.last.lock() {
            last.at = Instant::now();
            last.percent = percent;
            last.message = message.to_string();
        }
        tracing::debug!(percent, message, "progress");
        self.sink.report(percent, message);
    }

    /// Seconds since the last explicit report.
    pub fn idle(&self) -> std::time::Duration {
        self.last
            .lock()
            .map(|last| last.at.elapsed())
            .unwrap_or_default()
    }

    /// Start the background heartbeat for the duration of one operation.
    ///
    /// The returned guard aborts the heartbeat task when dropped. The
    /// heartbeat fires from its own timer, never from the task itself, so
    /// progress stays visible even while a capability call is blocked.
    pub fn watch(&self) -> HeartbeatGuard {
        let sink = Arc::clone(&self.sink);
        let last = Arc::clone(&self.last);
        let cadence = self.config.cadence();
        let staleness = self.config.staleness();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let snapshot = match last.lock() {
                    Ok(last) => last.clone(),
                    Err(_) => break,
                };
                let idle = snapshot.at.elapsed();
                if idle >= staleness {
                    tracing::warn!(
                        idle_secs = idle.as_secs(),
                        last_message = %snapshot.message,
                        "progress stalled"
                    );
                }
                if idle >= cadence {
                    sink.report(snapshot.percent, &snapshot.message);
                }
            }
        });

        HeartbeatGuard { handle }
    }
}

/// Aborts the heartbeat task when dropped.
pub struct HeartbeatGuard {
    handle: JoinHandle<()>,
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        events: AtomicUsize,
        last_percent: Mutex<u8>,
    }

    impl CountingSink {
        fn new() -> Self {
            Self { events: AtomicUsize::new(0), last_percent: Mutex::new(0) }
        }
    }

    impl ProgressSink for CountingSink {
        fn report(&self, percent: u8, _message: &str) {
            self.events.fetch_add(1, Ordering::SeqCst);
            *self.last_percent.lock().unwrap() = percent;
        }
    }

    #[tokio::test]
    async fn report_forwards_to_sink() {
        let sink = Arc::new(CountingSink::new());
        let monitor = ProgressMonitor::new(sink.clone(), MonitorConfig::default());
        monitor.report(40, "phase 1 complete");
        assert_eq!(sink.events.load(Ordering::SeqCst), 1);
        assert_eq!(*sink.last_percent.lock().unwrap(), 40);
    }

    #[tokio::test]
    async fn heartbeat_reemits_during_long_operation() {
        let sink = Arc::new(CountingSink::new());
        let config = MonitorConfig { cadence_secs: 1, staleness_secs: 60 };
        let monitor = ProgressMonitor::new(sink.clone(), config);
        monitor.report(10, "working");

        let guard = monitor.watch();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        drop(guard);

        // One explicit report plus at least one heartbeat re-emission.
        assert!(sink.events.load(Ordering::SeqCst) >= 2);
        assert_eq!(*sink.last_percent.lock().unwrap(), 10);
    }

    #[tokio::test]
    async fn idle_clock_resets_on_report() {
        let monitor = ProgressMonitor::new(Arc::new(CountingSink::new()), MonitorConfig::default());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(monitor.idle() >= std::time::Duration::from_millis(40));
        monitor.report(1, "tick");
        assert!(monitor.idle() < std::time::Duration::from_millis(40));
    }
}
