//! Bulk loader metrics: rows and batches committed to the note store.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct LoaderMetrics;

impl LoaderMetrics {
    /// Record a committed batch
    pub fn record_batch_committed(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "loader", "batches_committed")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "loader", "rows_inserted"))
            .increment(rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "loader", "batch_rows")).record(rows as f64);
    }

    pub fn record_load_failed() {
        ::metrics::counter!(phase_metric!(counter, "loader", "runs_failed")).increment(1);
    }

    pub fn record_load_duration(seconds: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "loader", "duration_seconds"))
            .record(seconds);
    }
}

impl PhaseMetrics for LoaderMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "loader", "batches_committed"));
        let _ = counter!(phase_metric!(counter, "loader", "rows_inserted"));
        let _ = counter!(phase_metric!(counter, "loader", "runs_failed"));
        let _ = histogram!(phase_metric!(histogram, "loader", "batch_rows"));
        let _ = histogram!(phase_metric!(histogram, "loader", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "loader"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "loader", "batches_committed"),
                metric_type: MetricType::Counter,
                help: "Number of batches committed to the note store",
            },
            MetricDoc {
                name: phase_metric!(counter, "loader", "rows_inserted"),
                metric_type: MetricType::Counter,
                help: "Number of note rows inserted",
            },
            MetricDoc {
                name: phase_metric!(counter, "loader", "runs_failed"),
                metric_type: MetricType::Counter,
                help: "Number of load runs that ended in an error",
            },
            MetricDoc {
                name: phase_metric!(histogram, "loader", "batch_rows"),
                metric_type: MetricType::Histogram,
                help: "Rows per committed batch",
            },
            MetricDoc {
                name: phase_metric!(histogram, "loader", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall-clock duration of a completed load",
            },
        ]
    }
}
