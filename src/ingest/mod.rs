// Ingestion: reading the source CSV (plain or gzip) into note records

pub mod csv_source;

pub use csv_source::{open_csv, require_columns, CsvSource, NoteColumns, NoteRows};
