// Persisted note store (SQLite) and its read-only query layer

pub mod note_store;
pub mod queries;

pub use note_store::NoteStore;
pub use queries::NoteStream;
