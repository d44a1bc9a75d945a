// Data pipeline: CSV -> note store, CSV -> SFT JSONL, and dataset exploration

pub mod converter;
pub mod explore;
pub mod loader;

pub use converter::{convert, to_example, ConvertOptions, SftConverter};
pub use explore::{explore, DatasetProfile, SectionCount};
pub use loader::{load, BulkLoader, LoadReport};
