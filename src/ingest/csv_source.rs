use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::constants::{
    COL_INPUT, COL_INPUT_TOKENS, COL_NOTE_ID, COL_TARGET, COL_TARGET_TOKENS, REQUIRED_COLUMNS,
};
use crate::domain::NoteRecord;
use crate::error::{NotesError, Result};

type BoxedReader = Box<dyn Read>;

/// Open a CSV file for reading, transparently decompressing if the path ends with `.gz`.
pub fn open_csv(path: &Path) -> Result<csv::Reader<BoxedReader>> {
    let file = File::open(path)?;
    let inner: BoxedReader = if path.extension().is_some_and(|ext| ext == "gz") {
        debug!(path = %path.display(), "reading gzip-compressed CSV");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    // Short rows are allowed; missing trailing cells read as blank
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(inner))
}

/// Read the header row and fail with a schema error unless every `required` column is present.
pub fn require_columns(
    reader: &mut csv::Reader<BoxedReader>,
    required: &[&str],
) -> Result<Vec<String>> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.as_str() == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NotesError::Schema {
            missing,
            found: headers,
        });
    }
    Ok(headers)
}

/// Header positions of the note columns; token columns are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteColumns {
    pub note_id: usize,
    pub input: usize,
    pub target: usize,
    pub input_tokens: Option<usize>,
    pub target_tokens: Option<usize>,
}

impl NoteColumns {
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        match (
            position(COL_NOTE_ID),
            position(COL_INPUT),
            position(COL_TARGET),
        ) {
            (Some(note_id), Some(input), Some(target)) => Ok(Self {
                note_id,
                input,
                target,
                input_tokens: position(COL_INPUT_TOKENS),
                target_tokens: position(COL_TARGET_TOKENS),
            }),
            _ => Err(NotesError::Schema {
                missing: REQUIRED_COLUMNS
                    .iter()
                    .filter(|c| position(**c).is_none())
                    .map(|c| c.to_string())
                    .collect(),
                found: headers.to_vec(),
            }),
        }
    }

    fn to_text_record(&self, row: &csv::StringRecord) -> NoteRecord {
        let field = |idx: usize| row.get(idx).unwrap_or("");
        NoteRecord::new(field(self.note_id), field(self.input), field(self.target))
    }

    fn to_record(&self, row: &csv::StringRecord) -> Result<NoteRecord> {
        let field = |idx: usize| row.get(idx).unwrap_or("");
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let input_tokens = self
            .input_tokens
            .map(|idx| parse_token_count(field(idx), COL_INPUT_TOKENS, line))
            .transpose()?
            .flatten();
        let target_tokens = self
            .target_tokens
            .map(|idx| parse_token_count(field(idx), COL_TARGET_TOKENS, line))
            .transpose()?
            .flatten();

        Ok(self.to_text_record(row).with_tokens(input_tokens, target_tokens))
    }
}

/// Blank cells are absent, not zero.
fn parse_token_count(raw: &str, column: &str, line: u64) -> Result<Option<u32>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| NotesError::InvalidRow {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// A note CSV whose header has already been validated.
pub struct CsvSource {
    reader: csv::Reader<BoxedReader>,
    columns: NoteColumns,
}

impl CsvSource {
    /// Open `path` and validate that `note_id`, `input` and `target` are present.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = open_csv(path)?;
        let headers = require_columns(&mut reader, &REQUIRED_COLUMNS)?;
        let columns = NoteColumns::from_headers(&headers)?;
        debug!(path = %path.display(), ?headers, "opened note CSV");
        Ok(Self { reader, columns })
    }

    /// Iterate the remaining rows in file order, token counts included.
    pub fn records(&mut self) -> NoteRows<'_> {
        NoteRows {
            inner: self.reader.records(),
            columns: &self.columns,
            with_tokens: true,
        }
    }

    /// Like [`CsvSource::records`], but only `note_id`, `input` and `target`
    /// are decoded. Token cells are never read, so bad values there cannot fail.
    pub fn text_records(&mut self) -> NoteRows<'_> {
        NoteRows {
            inner: self.reader.records(),
            columns: &self.columns,
            with_tokens: false,
        }
    }
}

pub struct NoteRows<'a> {
    inner: csv::StringRecordsIter<'a, BoxedReader>,
    columns: &'a NoteColumns,
    with_tokens: bool,
}

impl Iterator for NoteRows<'_> {
    type Item = Result<NoteRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.inner.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };
        if self.with_tokens {
            Some(self.columns.to_record(&row))
        } else {
            Some(Ok(self.columns.to_text_record(&row)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_reads_rows_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(
            &path,
            "note_id,input,target,input_tokens,target_tokens\nn1,hello,world,3,\nn2,\"a, b\",c,,7\n",
        )
        .unwrap();

        let mut source = CsvSource::open(&path).unwrap();
        let rows: Vec<NoteRecord> = source.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], NoteRecord::new("n1", "hello", "world").with_tokens(Some(3), None));
        assert_eq!(rows[1].input, "a, b");
        assert_eq!(rows[1].input_tokens, None);
        assert_eq!(rows[1].target_tokens, Some(7));
    }

    #[test]
    fn test_gzip_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"note_id,input,target\nn1,hello,world\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut source = CsvSource::open(&path).unwrap();
        let rows: Vec<NoteRecord> = source.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows, vec![NoteRecord::new("n1", "hello", "world")]);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "note_id,input\nn1,hello\n").unwrap();

        match CsvSource::open(&path) {
            Err(NotesError::Schema { missing, found }) => {
                assert_eq!(missing, vec!["target".to_string()]);
                assert_eq!(found, vec!["note_id".to_string(), "input".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = CsvSource::open(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(NotesError::Io(_))));
    }

    #[test]
    fn test_short_row_has_absent_tokens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(
            &path,
            "note_id,input,target,input_tokens,target_tokens\nn1,a,b,4,5\nn2,c,d\n",
        )
        .unwrap();

        let mut source = CsvSource::open(&path).unwrap();
        let rows: Vec<NoteRecord> = source.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows[0].input_tokens, Some(4));
        assert_eq!(rows[1], NoteRecord::new("n2", "c", "d"));
    }

    #[test]
    fn test_text_records_ignore_token_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "note_id,input,target,input_tokens,target_tokens\nn1,hello,world,n/a,1\n")
            .unwrap();

        let mut source = CsvSource::open(&path).unwrap();
        let rows: Vec<NoteRecord> = source.text_records().collect::<Result<_>>().unwrap();
        assert_eq!(rows, vec![NoteRecord::new("n1", "hello", "world")]);
    }

    #[test]
    fn test_bad_token_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "note_id,input,target,input_tokens\nn1,a,b,-4\n").unwrap();

        let mut source = CsvSource::open(&path).unwrap();
        let err = source.records().next().unwrap().unwrap_err();
        match err {
            NotesError::InvalidRow { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "input_tokens");
                assert_eq!(value, "-4");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
