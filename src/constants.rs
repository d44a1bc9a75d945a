/// Column names and defaults shared by the loader, converter and store.

// Required CSV columns
pub const COL_NOTE_ID: &str = "note_id";
pub const COL_INPUT: &str = "input";
pub const COL_TARGET: &str = "target";

// Optional CSV columns
pub const COL_INPUT_TOKENS: &str = "input_tokens";
pub const COL_TARGET_TOKENS: &str = "target_tokens";

pub const REQUIRED_COLUMNS: [&str; 3] = [COL_NOTE_ID, COL_INPUT, COL_TARGET];

pub const DEFAULT_BATCH_SIZE: usize = 5_000;
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_EXPLORE_SAMPLE_SIZE: usize = 100;

/// Provenance tag written into every SFT example's `meta.source`
pub const DEFAULT_SOURCE_TAG: &str = "physionet/mimic-iv-bhc";

pub const DEFAULT_CSV_PATH: &str =
    "physionet.org/files/labelled-notes-hospital-course/1.2.0/mimic-iv-bhc.csv";
pub const DEFAULT_DB_PATH: &str = "data/mimic-iv-bhc/notes.db";
pub const DEFAULT_OUT_PATH: &str = "data/mimic-iv-bhc/sft.jsonl";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "clinical_notes.toml";
