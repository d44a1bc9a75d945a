use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::app::ports::{NoProgress, ProgressSink};
use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SOURCE_TAG};
use crate::domain::{JoinStyle, NoteRecord, SftExample, SftMeta};
use crate::error::Result;
use crate::ingest::CsvSource;
use crate::metrics::ConverterMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Stop after this many rows; `None` or `Some(0)` converts the whole file.
    pub limit: Option<usize>,
    pub join_style: JoinStyle,
    /// Provenance tag written to `meta.source`
    pub source_tag: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            limit: None,
            join_style: JoinStyle::Plain,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
        }
    }
}

/// Build the SFT example for one note. Prompt and response are trimmed.
pub fn to_example(note: &NoteRecord, join_style: JoinStyle, source_tag: &str) -> SftExample {
    SftExample {
        id: note.note_id.clone(),
        text: join_style.render(note.input.trim(), note.target.trim()),
        meta: SftMeta {
            source: source_tag.to_string(),
        },
    }
}

/// Converts a note CSV into JSONL, one SFT example per line, in input order.
pub struct SftConverter {
    options: ConvertOptions,
}

impl SftConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Returns the number of examples written.
    pub fn convert(
        &self,
        csv_path: &Path,
        out_path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<usize> {
        // Validate the header before creating any output
        let mut source = CsvSource::open(csv_path)?;

        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(out_path)?);

        let limit = self.options.limit.filter(|n| *n > 0);
        let style = self.options.join_style;
        ConverterMetrics::record_run(style.as_str());
        progress.start("Converting notes", limit.map(|n| n as u64));

        let mut written = 0usize;
        for note in source.text_records() {
            let example = to_example(&note?, style, &self.options.source_tag);
            serde_json::to_writer(&mut writer, &example)?;
            writer.write_all(b"\n")?;
            ConverterMetrics::record_example_written(example.text.len());

            written += 1;
            if written % DEFAULT_BATCH_SIZE == 0 {
                progress.advance(written as u64);
            }
            if limit.is_some_and(|n| written >= n) {
                break;
            }
        }
        writer.flush()?;
        progress.finish(written as u64);

        info!(
            csv = %csv_path.display(),
            out = %out_path.display(),
            join_style = %style,
            examples = written,
            "conversion complete"
        );
        Ok(written)
    }
}

/// Convert `csv_path` to SFT JSONL at `out_path` with the default provenance tag.
pub fn convert(
    csv_path: &Path,
    out_path: &Path,
    limit: Option<usize>,
    join_style: JoinStyle,
) -> Result<usize> {
    SftConverter::new(ConvertOptions {
        limit,
        join_style,
        ..ConvertOptions::default()
    })
    .convert(csv_path, out_path, &mut NoProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotesError;
    use tempfile::tempdir;

    #[test]
    fn test_to_example_trims() {
        let note = NoteRecord::new("n1", "  hello \n", "\tworld ");
        let ex = to_example(&note, JoinStyle::ChatMl, "tag");
        assert_eq!(ex.id, "n1");
        assert_eq!(ex.text, "<|user|>\nhello\n<|assistant|>\nworld\n");
        assert_eq!(ex.meta.source, "tag");
    }

    #[test]
    fn test_limit_zero_means_everything() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("x.csv");
        std::fs::write(&csv, "note_id,input,target\na,1,1\nb,2,2\nc,3,3\n").unwrap();
        let out = dir.path().join("out.jsonl");

        assert_eq!(convert(&csv, &out, Some(0), JoinStyle::Plain).unwrap(), 3);
        assert_eq!(convert(&csv, &out, Some(2), JoinStyle::Plain).unwrap(), 2);
        assert_eq!(convert(&csv, &out, Some(10), JoinStyle::Plain).unwrap(), 3);
        let lines = std::fs::read_to_string(&out).unwrap();
        assert_eq!(lines.lines().count(), 3);
    }

    #[test]
    fn test_schema_error_creates_no_output() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("x.csv");
        std::fs::write(&csv, "id,input,target\na,1,1\n").unwrap();
        let out = dir.path().join("sub").join("out.jsonl");

        let err = convert(&csv, &out, None, JoinStyle::Plain).unwrap_err();
        assert!(matches!(err, NotesError::Schema { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_token_cells_are_not_parsed() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("x.csv");
        std::fs::write(
            &csv,
            "note_id,input,target,input_tokens,target_tokens\nn1,hello,world,n/a,1\nn2,foo,bar\n",
        )
        .unwrap();
        let out = dir.path().join("out.jsonl");

        assert_eq!(convert(&csv, &out, None, JoinStyle::Plain).unwrap(), 2);
        let first = std::fs::read_to_string(&out).unwrap();
        assert!(first.starts_with(r#"{"id":"n1","text":"Instruction:\nhello"#));
    }

    #[test]
    fn test_custom_source_tag() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("x.csv");
        std::fs::write(&csv, "note_id,input,target\na,1,1\n").unwrap();
        let out = dir.path().join("out.jsonl");

        let converter = SftConverter::new(ConvertOptions {
            source_tag: "local/dev".to_string(),
            ..ConvertOptions::default()
        });
        converter.convert(&csv, &out, &mut NoProgress).unwrap();
        let line = std::fs::read_to_string(&out).unwrap();
        assert!(line.contains(r#""meta":{"source":"local/dev"}"#));
    }
}
