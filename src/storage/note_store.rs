use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::NoteRecord;
use crate::error::{NotesError, Result};

const CREATE_SCHEMA: &str = r#"
    DROP TABLE IF EXISTS notes;
    CREATE TABLE notes (
        note_id       TEXT PRIMARY KEY,
        input         TEXT NOT NULL,
        target        TEXT NOT NULL,
        input_tokens  INTEGER,
        target_tokens INTEGER
    );
    CREATE INDEX idx_note_id ON notes(note_id);
"#;

const INSERT_NOTE: &str = "INSERT INTO notes (note_id, input, target, input_tokens, target_tokens)
     VALUES (?1, ?2, ?3, ?4, ?5)";

/// Owned handle to the SQLite note store.
///
/// The connection is closed when the store is dropped, so every exit path
/// releases it.
pub struct NoteStore {
    pub(crate) conn: Connection,
    path: PathBuf,
}

impl NoteStore {
    /// Open (creating if needed) a store that the loader will write to.
    /// The parent directory is created when missing.
    pub fn open_for_load<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)
            .map_err(|e| NotesError::store_unavailable(db_path, e))?;
        debug!(path = %db_path.display(), "opened note store for loading");
        Ok(Self {
            conn,
            path: db_path.to_path_buf(),
        })
    }

    /// Open an already-loaded store for queries. Fails with `StoreUnavailable`
    /// if the file is missing, unreadable, or has no `notes` table.
    pub fn open_existing<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            return Err(NotesError::store_unavailable(db_path, "database file not found"));
        }
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| NotesError::store_unavailable(db_path, e))?;

        let store = Self {
            conn,
            path: db_path.to_path_buf(),
        };
        store.ensure_notes_table()?;
        Ok(store)
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| NotesError::store_unavailable(":memory:", e))?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_notes_table(&self) -> Result<()> {
        let present: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'notes'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| NotesError::store_unavailable(&self.path, e))?;
        if present == 0 {
            return Err(NotesError::store_unavailable(&self.path, "no 'notes' table"));
        }
        Ok(())
    }

    /// Drop any existing `notes` table and create an empty one with its index.
    pub fn recreate_schema(&self) -> Result<()> {
        self.conn.execute_batch(CREATE_SCHEMA)?;
        info!(path = %self.path.display(), "created notes table");
        Ok(())
    }

    /// Insert one batch in a single transaction and commit it.
    pub fn insert_batch(&mut self, batch: &[NoteRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_NOTE)?;
            for note in batch {
                stmt.execute(params![
                    note.note_id,
                    note.input,
                    note.target,
                    note.input_tokens,
                    note.target_tokens
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
