/// Receives incremental row counts from long-running operations (load, convert).
pub trait ProgressSink {
    /// Called when an operation starts; `total` is known only for some inputs.
    fn start(&mut self, operation: &str, total: Option<u64>);

    /// Cumulative number of rows handled so far.
    fn advance(&mut self, rows_done: u64);

    fn finish(&mut self, rows_done: u64);
}

/// Sink that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _operation: &str, _total: Option<u64>) {}
    fn advance(&mut self, _rows_done: u64) {}
    fn finish(&mut self, _rows_done: u64) {}
}
