use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::ingest::{open_csv, require_columns};
use crate::sections::SectionLabel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionCount {
    pub label: String,
    /// Sampled notes whose text mentions the label (case-insensitive)
    pub notes: usize,
}

/// Structural overview of a notes CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub columns: Vec<String>,
    pub row_count: u64,
    pub text_column: String,
    /// Rows actually inspected for section prevalence
    pub sampled: usize,
    pub mean_text_chars: f64,
    pub section_prevalence: Vec<SectionCount>,
}

/// Count rows, and check the first `sample_size` rows' `text_column` for
/// each known section header. Works on any CSV with a header row, including
/// the raw discharge-note export (whose text column is `text`).
pub fn explore(csv_path: &Path, text_column: &str, sample_size: usize) -> Result<DatasetProfile> {
    let mut reader = open_csv(csv_path)?;
    let columns = require_columns(&mut reader, &[text_column])?;
    let text_idx = columns
        .iter()
        .position(|c| c == text_column)
        .unwrap_or_default();

    let needles: Vec<String> = SectionLabel::ALL
        .iter()
        .map(|l| l.as_str().to_lowercase())
        .collect();
    let mut hits = vec![0usize; needles.len()];

    let mut row_count = 0u64;
    let mut sampled = 0usize;
    let mut total_chars = 0usize;
    for row in reader.records() {
        let row = row?;
        row_count += 1;
        if sampled < sample_size {
            let text = row.get(text_idx).unwrap_or("");
            total_chars += text.chars().count();
            let lowered = text.to_lowercase();
            for (count, needle) in hits.iter_mut().zip(&needles) {
                if lowered.contains(needle.as_str()) {
                    *count += 1;
                }
            }
            sampled += 1;
        }
    }

    let mean_text_chars = if sampled == 0 {
        0.0
    } else {
        total_chars as f64 / sampled as f64
    };
    info!(
        csv = %csv_path.display(),
        rows = row_count,
        sampled,
        "explored dataset"
    );

    Ok(DatasetProfile {
        columns,
        row_count,
        text_column: text_column.to_string(),
        sampled,
        mean_text_chars,
        section_prevalence: SectionLabel::ALL
            .iter()
            .zip(hits)
            .map(|(label, notes)| SectionCount {
                label: label.as_str().to_string(),
                notes,
            })
            .collect(),
    })
}
