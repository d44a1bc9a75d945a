//! Bounded section scanner.
//!
//! Finds a label, then the line break that opens its body, then the first
//! terminator: a line that looks like a new `Header:` line, a line starting
//! with the `___` redaction marker, or the end of the text. Every byte is
//! visited a bounded number of times, so adversarial text cannot trigger
//! backtracking blow-ups.

use regex::RegexBuilder;
use tracing::warn;

/// Redaction marker run that ends a section when it starts a line.
pub const REDACTION_MARKER: &str = "___";

/// Extract the body of the first `label` section in `full_text`.
///
/// The label match is case-insensitive. Returns `None` when no occurrence of
/// the label is followed by a `:`/whitespace run containing a line break.
pub fn extract_section(full_text: &str, label: &str) -> Option<String> {
    if label.is_empty() {
        return None;
    }
    let finder = match RegexBuilder::new(&regex::escape(label))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            warn!(label, error = %e, "section label cannot be searched");
            return None;
        }
    };

    let found = finder.find_iter(full_text).find_map(|m| {
        let body_start = body_start_after(full_text, m.end())?;
        let body_end = body_end_from(full_text, body_start);
        Some(full_text[body_start..body_end].trim().to_string())
    });
    found
}

/// Skip the `:`/whitespace run after a label. The body starts after the last
/// line break in that run; no line break means this occurrence is not a header.
fn body_start_after(text: &str, label_end: usize) -> Option<usize> {
    let mut last_newline = None;
    for (offset, c) in text[label_end..].char_indices() {
        match c {
            '\n' => last_newline = Some(label_end + offset),
            ':' => {}
            c if c.is_whitespace() => {}
            _ => break,
        }
    }
    last_newline.map(|nl| nl + 1)
}

/// Position of the first line break (at or after `from`) that is followed by a
/// terminator line, or the end of the text.
fn body_end_from(text: &str, from: usize) -> usize {
    let mut search_from = from;
    while let Some(rel) = text[search_from..].find('\n') {
        let newline = search_from + rel;
        let rest = &text[newline + 1..];
        if rest.starts_with(REDACTION_MARKER) || starts_with_header_line(rest) {
            return newline;
        }
        search_from = newline + 1;
    }
    text.len()
}

/// True when `rest` begins with a line shaped like `Some Words:` that is
/// itself terminated by a line break (trailing spaces allowed). Letter case
/// is ignored, as it is for the label.
fn starts_with_header_line(rest: &str) -> bool {
    let Some(line_end) = rest.find('\n') else {
        return false;
    };
    let line = rest[..line_end].trim_end_matches([' ', '\t', '\r']);
    let Some(label) = line.strip_suffix(':') else {
        return false;
    };

    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    let tail = chars.as_str();
    !tail.is_empty()
        && tail
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '\t')
}
