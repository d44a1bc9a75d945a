//! Query layer metrics.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct QueryMetrics;

impl QueryMetrics {
    pub fn record_query(operation: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "query", "calls"), "operation" => operation)
            .increment(1);
    }

    pub fn record_stream_chunk(rows: usize) {
        ::metrics::histogram!(phase_metric!(histogram, "query", "stream_chunk_rows"))
            .record(rows as f64);
    }
}

impl PhaseMetrics for QueryMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "query", "calls"));
        let _ = histogram!(phase_metric!(histogram, "query", "stream_chunk_rows"));
    }

    fn phase_name() -> &'static str {
        "query"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "query", "calls"),
                metric_type: MetricType::Counter,
                help: "Query layer calls, labelled by operation",
            },
            MetricDoc {
                name: phase_metric!(histogram, "query", "stream_chunk_rows"),
                metric_type: MetricType::Histogram,
                help: "Rows fetched per stream_all chunk",
            },
        ]
    }
}
