use rusqlite::{params, OptionalExtension, Row};
use std::collections::VecDeque;
use tracing::debug;

use crate::domain::NoteRecord;
use crate::error::Result;
use crate::metrics::QueryMetrics;
use crate::storage::NoteStore;

const NOTE_COLUMNS: &str = "note_id, input, target, input_tokens, target_tokens";

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<NoteRecord> {
    Ok(NoteRecord {
        note_id: row.get(0)?,
        input: row.get(1)?,
        target: row.get(2)?,
        input_tokens: row.get(3)?,
        target_tokens: row.get(4)?,
    })
}

fn as_sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Escape LIKE wildcards so the needle matches literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl NoteStore {
    /// Exact-match lookup by primary key.
    pub fn get_by_id(&self, note_id: &str) -> Result<Option<NoteRecord>> {
        QueryMetrics::record_query("get_by_id");
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ?1"))?;
        let note = stmt.query_row(params![note_id], row_to_note).optional()?;
        debug!(note_id, found = note.is_some(), "get_by_id");
        Ok(note)
    }

    /// Up to `limit` notes starting at `offset`, in insertion (rowid) order.
    pub fn get_page(&self, limit: usize, offset: usize) -> Result<Vec<NoteRecord>> {
        QueryMetrics::record_query("get_page");
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY rowid LIMIT ?1 OFFSET ?2"
        ))?;
        let notes = stmt
            .query_map(params![as_sql_count(limit), as_sql_count(offset)], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(limit, offset, returned = notes.len(), "get_page");
        Ok(notes)
    }

    /// Notes whose `input` or `target` contains `needle`, using SQLite's
    /// default LIKE semantics (ASCII case-insensitive).
    pub fn search(&self, needle: &str, limit: usize) -> Result<Vec<NoteRecord>> {
        QueryMetrics::record_query("search");
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE input LIKE ?1 ESCAPE '\\' OR target LIKE ?1 ESCAPE '\\'
             ORDER BY rowid LIMIT ?2"
        ))?;
        let notes = stmt
            .query_map(params![like_pattern(needle), as_sql_count(limit)], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(needle, limit, returned = notes.len(), "search");
        Ok(notes)
    }

    pub fn count(&self) -> Result<u64> {
        QueryMetrics::record_query("count");
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Lazily iterate every note, fetching `chunk_size` rows at a time.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn stream_all(&self, chunk_size: usize) -> NoteStream<'_> {
        QueryMetrics::record_query("stream_all");
        NoteStream {
            store: self,
            chunk_size: chunk_size.max(1),
            last_rowid: i64::MIN,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// Keyset-paginated cursor over the notes table.
///
/// Not restartable; call [`NoteStore::stream_all`] again to re-read from the start.
pub struct NoteStream<'a> {
    store: &'a NoteStore,
    chunk_size: usize,
    last_rowid: i64,
    buffer: VecDeque<NoteRecord>,
    exhausted: bool,
}

impl NoteStream<'_> {
    fn fetch_chunk(&mut self) -> Result<()> {
        let mut stmt = self.store.conn.prepare_cached(&format!(
            "SELECT rowid, {NOTE_COLUMNS} FROM notes WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
        ))?;
        let mut rows = stmt.query(params![self.last_rowid, as_sql_count(self.chunk_size)])?;
        let mut fetched = 0usize;
        while let Some(row) = rows.next()? {
            self.last_rowid = row.get(0)?;
            self.buffer.push_back(NoteRecord {
                note_id: row.get(1)?,
                input: row.get(2)?,
                target: row.get(3)?,
                input_tokens: row.get(4)?,
                target_tokens: row.get(5)?,
            });
            fetched += 1;
        }
        QueryMetrics::record_stream_chunk(fetched);
        if fetched < self.chunk_size {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Iterator for NoteStream<'_> {
    type Item = Result<NoteRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_chunk() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
