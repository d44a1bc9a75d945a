//! Clinical notes tooling: load a notes CSV into SQLite, query it, extract
//! labelled sections from note text, and convert rows into SFT JSONL.

pub mod constants;
pub mod error;
pub mod config;
pub mod logging;
pub mod metrics;

// Domain data shapes shared across layers
pub mod domain;

pub mod ingest;
pub mod pipeline;
pub mod sections;
pub mod storage;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use domain::{JoinStyle, NoteRecord, NoteSummary, SftExample};
pub use error::{NotesError, Result};
pub use pipeline::{convert, explore, load};
pub use sections::{extract_section, summarize, SectionLabel};
pub use storage::NoteStore;
