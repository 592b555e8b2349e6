//! Progress sink adapters for the CLI and for tests.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc;
use std::sync::Mutex;

use crate::domain::ports::ProgressSink;

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}% {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Terminal progress bar sink backed by indicatif.
pub struct IndicatifProgressSink {
    bar: ProgressBar,
}

impl IndicatifProgressSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .expect("Invalid progress bar template")
                .progress_chars(PROGRESS_CHARS),
        );
        Self { bar }
    }

    /// Finish the bar, leaving the last message visible.
    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }
}

impl Default for IndicatifProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for IndicatifProgressSink {
    fn report(&self, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(message.to_string());
    }
}

/// Sink that forwards events to a channel; used by tests and embedders.
pub struct ChannelProgressSink {
    tx: Mutex<mpsc::Sender<(u8, String)>>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::Receiver<(u8, String)>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, percent: u8, message: &str) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send((percent, message.to_string()));
        }
    }
}
