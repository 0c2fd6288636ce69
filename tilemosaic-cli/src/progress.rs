//! Terminal spinner for long-running builds.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tilemosaic::report::ProgressReporter;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Shows the latest progress report next to a spinner.
pub struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]);
        bar.set_style(style);
        bar.enable_steady_tick(TICK_INTERVAL);
        Self { bar }
    }

    /// A reporter that draws nothing, for quiet runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&self, message: &str) {
        tracing::debug!(target: "tilemosaic_cli::progress", "{}", message);
        self.bar.set_message(message.to_string());
    }
}
