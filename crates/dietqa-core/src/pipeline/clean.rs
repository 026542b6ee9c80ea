//! Transcript noise removal applied before a speech goes into a prompt

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "○speaker name　" at the very start of a transcript
    static ref SPEAKER_MARKER_RE: Regex = Regex::new(r"^○.+?\u{3000}").unwrap();
    static ref LINE_INDENT_RE: Regex = Regex::new(r"(?m)^\u{3000}").unwrap();
}

/// Normalize line endings, drop the leading speaker marker and per-line indents
pub fn clean_speech(speech: &str) -> String {
    let speech = speech.replace("\r\n", "\n");
    let speech = SPEAKER_MARKER_RE.replace(&speech, "");
    LINE_INDENT_RE.replace_all(&speech, "").into_owned()
}
