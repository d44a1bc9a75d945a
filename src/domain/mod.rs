// Domain data shapes shared across layers

pub mod note;
pub mod sft;

pub use note::{NoteRecord, NoteSummary};
pub use sft::{JoinStyle, SftExample, SftMeta};
