use anyhow::Result;
use clinical_notes::app::NoProgress;
use clinical_notes::ingest::CsvSource;
use clinical_notes::{load, NoteRecord, NoteStore, NotesError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_fixture(dir: &Path, rows: usize) -> PathBuf {
    let mut body = String::from("note_id,input,target,input_tokens,target_tokens\n");
    for i in 0..rows {
        let input_tokens = if i % 3 == 0 { String::new() } else { (i * 10).to_string() };
        body.push_str(&format!(
            "{}-DS-{i},\"Chief Complaint:\nfinding {i}\nAllergies:\nNone\",\"summary, part {i}\",{input_tokens},{}\n",
            10_000 + i,
            i + 1
        ));
    }
    let path = dir.join("mimic-iv-bhc.csv");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn loaded_records_match_source_rows() -> Result<()> {
    let dir = tempdir()?;
    let csv = write_fixture(dir.path(), 12);
    let db = dir.path().join("db").join("notes.db");

    let report = load(&csv, &db, 5, &mut NoProgress)?;
    assert_eq!(report.rows, 12);
    assert_eq!(report.batches, 3);

    let store = NoteStore::open_existing(&db)?;
    let mut source = CsvSource::open(&csv)?;
    for row in source.records() {
        let expected = row?;
        let stored = store.get_by_id(&expected.note_id)?.expect("loaded note");
        assert_eq!(stored, expected);
    }
    Ok(())
}

#[test]
fn blank_token_cells_are_absent() -> Result<()> {
    let dir = tempdir()?;
    let csv = write_fixture(dir.path(), 4);
    let db = dir.path().join("notes.db");
    load(&csv, &db, 100, &mut NoProgress)?;

    let store = NoteStore::open_existing(&db)?;
    let first = store.get_by_id("10000-DS-0")?.unwrap();
    assert_eq!(first.input_tokens, None);
    assert_eq!(first.target_tokens, Some(1));
    let second = store.get_by_id("10001-DS-1")?.unwrap();
    assert_eq!(second.input_tokens, Some(10));
    Ok(())
}

#[test]
fn stream_all_yields_every_record_once() -> Result<()> {
    let dir = tempdir()?;
    let csv = write_fixture(dir.path(), 37);
    let db = dir.path().join("notes.db");
    load(&csv, &db, 10, &mut NoProgress)?;

    let store = NoteStore::open_existing(&db)?;
    let notes: Vec<NoteRecord> = store.stream_all(8).collect::<Result<_, _>>()?;
    assert_eq!(notes.len(), 37);
    let ids: HashSet<String> = notes.into_iter().map(|n| n.note_id).collect();
    assert_eq!(ids.len(), 37);
    assert_eq!(store.count()?, 37);
    Ok(())
}

#[test]
fn pagination_covers_table_without_overlap() -> Result<()> {
    let dir = tempdir()?;
    let csv = write_fixture(dir.path(), 10);
    let db = dir.path().join("notes.db");
    load(&csv, &db, 3, &mut NoProgress)?;

    let store = NoteStore::open_existing(&db)?;
    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = store.get_page(4, offset)?;
        if page.is_empty() {
            break;
        }
        offset += page.len();
        seen.extend(page.into_iter().map(|n| n.note_id));
    }
    assert_eq!(seen.len(), 10);
    assert_eq!(seen[0], "10000-DS-0");
    assert_eq!(seen[9], "10009-DS-9");
    Ok(())
}

#[test]
fn search_finds_target_text() -> Result<()> {
    let dir = tempdir()?;
    let csv = write_fixture(dir.path(), 20);
    let db = dir.path().join("notes.db");
    load(&csv, &db, 100, &mut NoProgress)?;

    let store = NoteStore::open_existing(&db)?;
    let hits = store.search("part 13", 10)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note_id, "10013-DS-13");

    assert_eq!(store.search("Chief Complaint", 5)?.len(), 5);
    assert!(store.search("no such phrase", 5)?.is_empty());
    Ok(())
}

#[test]
fn reload_replaces_previous_contents() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("notes.db");
    let big = write_fixture(dir.path(), 9);
    load(&big, &db, 4, &mut NoProgress)?;

    let small = dir.path().join("small.csv");
    std::fs::write(&small, "note_id,input,target\nonly,one,row\n")?;
    load(&small, &db, 4, &mut NoProgress)?;

    let store = NoteStore::open_existing(&db)?;
    assert_eq!(store.count()?, 1);
    assert!(store.get_by_id("10000-DS-0")?.is_none());
    Ok(())
}

#[test]
fn missing_target_column_fails_before_any_write() -> Result<()> {
    let dir = tempdir()?;
    let csv = dir.path().join("bad.csv");
    std::fs::write(&csv, "note_id,input\nn1,hello\n")?;
    let db = dir.path().join("notes.db");

    let err = load(&csv, &db, 10, &mut NoProgress).unwrap_err();
    assert!(matches!(err, NotesError::Schema { .. }));

    // no notes table was created, so the store is not queryable
    let reopened = NoteStore::open_existing(&db);
    assert!(matches!(reopened, Err(NotesError::StoreUnavailable { .. })));
    Ok(())
}

#[test]
fn queries_fail_when_store_missing() {
    let dir = tempdir().unwrap();
    let result = NoteStore::open_existing(dir.path().join("absent.db"));
    assert!(matches!(result, Err(NotesError::StoreUnavailable { .. })));
}

#[test]
fn missing_csv_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load(
        &dir.path().join("absent.csv"),
        &dir.path().join("notes.db"),
        10,
        &mut NoProgress,
    )
    .unwrap_err();
    assert!(matches!(err, NotesError::Io(_)));
}
