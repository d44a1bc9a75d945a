//! Metrics for the clinical notes pipeline
//!
//! Each phase (load, convert, query) defines its own metrics in a dedicated
//! submodule. Nothing is exported over the network: when
//! `CLINICAL_NOTES_METRICS_FILE` is set, the CLI installs an in-process
//! Prometheus recorder and writes a text snapshot to that file on exit.

pub mod converter;
pub mod loader;
pub mod query;

pub use converter::ConverterMetrics;
pub use loader::LoaderMetrics;
pub use query::QueryMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the in-process Prometheus recorder and register all phase metrics.
///
/// Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("metrics recorder handle was already stored");
            }
            register_all_metrics();
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Write the current snapshot to `path`. No-op without an installed recorder.
pub fn write_snapshot(path: &Path) -> std::io::Result<()> {
    if let Some(text) = render() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        info!(path = %path.display(), "wrote metrics snapshot");
    }
    Ok(())
}

pub fn register_all_metrics() {
    LoaderMetrics::register_metrics();
    ConverterMetrics::register_metrics();
    QueryMetrics::register_metrics();
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase so they show up in snapshots even at zero
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Build a metric name following clinical_notes_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("clinical_notes_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("clinical_notes_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_naming_convention() {
        assert_eq!(
            phase_metric!(counter, "loader", "rows_inserted"),
            "clinical_notes_loader_rows_inserted_total"
        );
        assert_eq!(
            phase_metric!(histogram, "query", "stream_chunk_rows"),
            "clinical_notes_query_stream_chunk_rows"
        );
    }

    #[test]
    fn test_all_documented_names_are_prefixed() {
        let docs = LoaderMetrics::metrics_documentation()
            .into_iter()
            .chain(ConverterMetrics::metrics_documentation())
            .chain(QueryMetrics::metrics_documentation());
        for doc in docs {
            assert!(doc.name.starts_with("clinical_notes_"), "{}", doc.name);
        }
    }
}
