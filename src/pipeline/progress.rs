//! Progress reporting for long-running stages.

use tracing::info;

/// Receives one message per unit of work ("summary for idea 2 of 5").
pub trait ProgressSink: Send + Sync {
    fn message(&self, message: &str);
}

/// Writes progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn message(&self, message: &str) {
        info!("{}", message);
    }
}
