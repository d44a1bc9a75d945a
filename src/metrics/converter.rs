//! SFT converter metrics.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ConverterMetrics;

impl ConverterMetrics {
    pub fn record_example_written(text_bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "converter", "examples_written")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "converter", "text_bytes"))
            .record(text_bytes as f64);
    }

    pub fn record_run(join_style: &str) {
        ::metrics::counter!(
            phase_metric!(counter, "converter", "runs"),
            "join_style" => join_style.to_string()
        )
        .increment(1);
    }
}

impl PhaseMetrics for ConverterMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "converter", "examples_written"));
        let _ = counter!(phase_metric!(counter, "converter", "runs"));
        let _ = histogram!(phase_metric!(histogram, "converter", "text_bytes"));
    }

    fn phase_name() -> &'static str {
        "converter"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "converter", "examples_written"),
                metric_type: MetricType::Counter,
                help: "SFT examples written to JSONL",
            },
            MetricDoc {
                name: phase_metric!(counter, "converter", "runs"),
                metric_type: MetricType::Counter,
                help: "Conversion runs, labelled by join style",
            },
            MetricDoc {
                name: phase_metric!(histogram, "converter", "text_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of each rendered SFT text field in bytes",
            },
        ]
    }
}
