use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Unexpected CSV header: missing required column(s) {missing:?}; got {found:?}")]
    Schema {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Note store unavailable at {path}: {message}")]
    StoreUnavailable { path: PathBuf, message: String },

    #[error("Invalid value {value:?} for column '{column}' on CSV line {line}")]
    InvalidRow {
        line: u64,
        column: String,
        value: String,
    },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NotesError {
    pub fn store_unavailable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        NotesError::StoreUnavailable {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotesError>;
