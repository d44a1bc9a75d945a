use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NotesError;

/// How an input/target pair is joined into the single `text` field used for SFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStyle {
    #[default]
    Plain,
    /// Conservative chat markup; does not depend on any tokenizer chat template.
    ChatMl,
}

impl JoinStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStyle::Plain => "plain",
            JoinStyle::ChatMl => "chatml",
        }
    }

    pub fn render(&self, prompt: &str, response: &str) -> String {
        match self {
            JoinStyle::Plain => format!("Instruction:\n{prompt}\n\nResponse:\n{response}\n"),
            JoinStyle::ChatMl => format!("<|user|>\n{prompt}\n<|assistant|>\n{response}\n"),
        }
    }
}

impl FromStr for JoinStyle {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(JoinStyle::Plain),
            "chatml" => Ok(JoinStyle::ChatMl),
            other => Err(NotesError::Config(format!(
                "Unknown join style '{other}' (expected 'plain' or 'chatml')"
            ))),
        }
    }
}

impl fmt::Display for JoinStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the SFT JSONL output. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SftExample {
    pub id: String,
    pub text: String,
    pub meta: SftMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SftMeta {
    pub source: String,
}
