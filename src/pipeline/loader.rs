use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

use crate::app::ports::ProgressSink;
use crate::constants::DEFAULT_BATCH_SIZE;
use crate::domain::NoteRecord;
use crate::error::Result;
use crate::ingest::CsvSource;
use crate::metrics::LoaderMetrics;
use crate::storage::NoteStore;

/// Outcome of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: u64,
    pub batches: u64,
}

/// Streams a note CSV into the store in fixed-size, individually committed batches.
pub struct BulkLoader {
    batch_size: usize,
}

impl Default for BulkLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BulkLoader {
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Replace the contents of `store` with the rows of `csv_path`.
    ///
    /// The header is validated before the store is touched, so a schema error
    /// leaves any existing table intact. Once loading starts, every batch is
    /// committed before the next one is read; a failure keeps earlier batches.
    pub fn load(
        &self,
        csv_path: &Path,
        store: &mut NoteStore,
        progress: &mut dyn ProgressSink,
    ) -> Result<LoadReport> {
        let started = Instant::now();
        match self.run(csv_path, store, progress) {
            Ok(report) => {
                LoaderMetrics::record_load_duration(started.elapsed().as_secs_f64());
                info!(
                    csv = %csv_path.display(),
                    store = %store.path().display(),
                    rows = report.rows,
                    batches = report.batches,
                    "load complete"
                );
                Ok(report)
            }
            Err(e) => {
                LoaderMetrics::record_load_failed();
                error!(csv = %csv_path.display(), error = %e, "load failed");
                Err(e)
            }
        }
    }

    fn run(
        &self,
        csv_path: &Path,
        store: &mut NoteStore,
        progress: &mut dyn ProgressSink,
    ) -> Result<LoadReport> {
        let mut source = CsvSource::open(csv_path)?;
        store.recreate_schema()?;
        progress.start("Importing notes", None);

        let mut report = LoadReport { rows: 0, batches: 0 };
        let mut batch: Vec<NoteRecord> = Vec::with_capacity(self.batch_size);

        for note in source.records() {
            batch.push(note?);
            if batch.len() >= self.batch_size {
                self.commit(store, &mut batch, &mut report, progress)?;
            }
        }
        if !batch.is_empty() {
            self.commit(store, &mut batch, &mut report, progress)?;
        }

        progress.finish(report.rows);
        Ok(report)
    }

    fn commit(
        &self,
        store: &mut NoteStore,
        batch: &mut Vec<NoteRecord>,
        report: &mut LoadReport,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        store.insert_batch(batch)?;
        LoaderMetrics::record_batch_committed(batch.len());
        report.rows += batch.len() as u64;
        report.batches += 1;
        batch.clear();
        progress.advance(report.rows);
        Ok(())
    }
}

/// Load `csv_path` into a freshly created store at `db_path` (parent directories are created).
pub fn load(
    csv_path: &Path,
    db_path: &Path,
    batch_size: usize,
    progress: &mut dyn ProgressSink,
) -> Result<LoadReport> {
    let mut store = NoteStore::open_for_load(db_path)?;
    BulkLoader::new(batch_size).load(csv_path, &mut store, progress)
}
