use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use tracing::info;

use crate::app::ports::ProgressSink;

/// Progress reported through `tracing` events, for non-interactive runs.
#[derive(Debug, Default)]
pub struct TracingProgress {
    operation: String,
}

impl ProgressSink for TracingProgress {
    fn start(&mut self, operation: &str, total: Option<u64>) {
        self.operation = operation.to_string();
        info!(operation, ?total, "started");
    }

    fn advance(&mut self, rows_done: u64) {
        info!(operation = %self.operation, rows = rows_done, "progress");
    }

    fn finish(&mut self, rows_done: u64) {
        info!(operation = %self.operation, rows = rows_done, "finished");
    }
}

/// Terminal progress bar (spinner when the total is unknown).
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn start(&mut self, operation: &str, total: Option<u64>) {
        self.bar = match total {
            Some(n) => {
                let bar = ProgressBar::new(n);
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg} [{bar:40}] {human_pos}/{human_len} rows ({per_sec}, eta {eta})",
                ) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::with_template("{spinner} {msg}: {human_pos} rows ({per_sec})")
                {
                    bar.set_style(style);
                }
                bar
            }
        };
        self.bar.set_message(operation.to_string());
    }

    fn advance(&mut self, rows_done: u64) {
        self.bar.set_position(rows_done);
    }

    fn finish(&mut self, rows_done: u64) {
        self.bar.set_position(rows_done);
        self.bar.finish_with_message(format!("done, {} rows", HumanCount(rows_done)));
    }
}
