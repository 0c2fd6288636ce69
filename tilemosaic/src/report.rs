//! Progress reporting.
//!
//! Long-running operations describe what they are doing through a
//! [`ProgressReporter`]. This is separate from logging: reports are meant
//! for the person waiting on the result.

use std::sync::Arc;

/// Receives human-readable progress messages.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Forwards reports to the `tracing` log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::info!(target: "tilemosaic::progress", "{}", message);
    }
}

/// Discards all reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {
    fn report(&self, _message: &str) {}
}

/// Shared reporter handle.
pub type SharedReporter = Arc<dyn ProgressReporter>;

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Reporter that keeps every message for assertions.
    #[derive(Default)]
    pub struct RecordingReporter {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_reporters_are_object_safe() {
        let reporters: Vec<SharedReporter> = vec![
            Arc::new(TracingReporter),
            Arc::new(NoOpReporter),
            Arc::new(RecordingReporter::default()),
        ];
        for reporter in &reporters {
            reporter.report("assembling column 1 of 2");
        }
    }

    #[test]
    fn test_recording_reporter_keeps_order() {
        let reporter = RecordingReporter::default();
        reporter.report("first");
        reporter.report("second");
        assert_eq!(reporter.messages(), vec!["first", "second"]);
    }
}
