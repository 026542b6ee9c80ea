//! Re-anchor a model's `<u>`-annotated copy of a speech onto the original text
//!
//! The model is only trusted for where the markers go. Every literal run of
//! its output is replaced by the same number of characters taken from the
//! original, so the result is the original text with markers inserted. When
//! the model changed the length of a run, later markers shift; that drift is
//! tolerated.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MARKER_RE: Regex = Regex::new(r"</?u>").unwrap();
}

pub const OPEN_MARKER: &str = "<u>";
pub const CLOSE_MARKER: &str = "</u>";

/// A piece of annotated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Marker(&'a str),
    Literal(&'a str),
}

/// Split on `<u>` / `</u>`, keeping the markers as their own chunks
pub fn split_markers(annotated: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut last = 0;
    for m in MARKER_RE.find_iter(annotated) {
        chunks.push(Chunk::Literal(&annotated[last..m.start()]));
        chunks.push(Chunk::Marker(m.as_str()));
        last = m.end();
    }
    chunks.push(Chunk::Literal(&annotated[last..]));
    chunks
}

/// Rebuild `annotated` from the characters of `original`
pub fn apply_annotation(original: &str, annotated: &str) -> String {
    let original = original.replace("\r\n", "\n");
    let annotated = annotated.replace("\r\n", "\n");
    let orig_chars: Vec<char> = original.chars().collect();

    let mut output = String::with_capacity(original.len() + annotated.len() / 4);
    let mut cursor = 0;

    for chunk in split_markers(&annotated) {
        match chunk {
            Chunk::Marker(marker) => output.push_str(marker),
            Chunk::Literal(text) => {
                let start = cursor.min(orig_chars.len());
                let end = (cursor + text.chars().count()).min(orig_chars.len());
                output.extend(&orig_chars[start..end]);
                cursor = end;
            }
        }
    }

    if cursor < orig_chars.len() {
        tracing::debug!(
            "Annotation ended {} chars before the original; appending the rest",
            orig_chars.len() - cursor
        );
        output.extend(&orig_chars[cursor..]);
    }

    output
}

/// Drop every `<u>` / `</u>` marker
pub fn strip_markers(text: &str) -> String {
    MARKER_RE.replace_all(text, "").into_owned()
}
