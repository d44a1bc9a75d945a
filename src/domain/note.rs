use serde::{Deserialize, Serialize};

/// One dataset row: a source note (`input`) paired with its labelled summary (`target`).
///
/// Records are built once from a CSV row and never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub note_id: String,
    pub input: String,
    pub target: String,
    pub input_tokens: Option<u32>,
    pub target_tokens: Option<u32>,
}

impl NoteRecord {
    pub fn new(
        note_id: impl Into<String>,
        input: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            note_id: note_id.into(),
            input: input.into(),
            target: target.into(),
            input_tokens: None,
            target_tokens: None,
        }
    }

    pub fn with_tokens(mut self, input_tokens: Option<u32>, target_tokens: Option<u32>) -> Self {
        self.input_tokens = input_tokens;
        self.target_tokens = target_tokens;
        self
    }
}

/// Headline sections pulled out of a note's free text. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub note_id: String,
    pub chief_complaint: Option<String>,
    pub brief_hospital_course: Option<String>,
    pub discharge_diagnosis: Option<String>,
    /// Length of the full text in characters
    pub text_length: usize,
}
