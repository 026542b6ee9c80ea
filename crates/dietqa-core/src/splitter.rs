//! Overlapping windows over long speeches
//!
//! Offsets are character (not byte) positions into the speech text.

use serde::{Deserialize, Serialize};

/// One half-open character range of a speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Which windows survive the query check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFilter {
    /// Keep a window when at least one query has all its terms in it
    AnyQuery,
    /// Drop a window as soon as one query has a term missing from it
    ///
    /// Terms are the whitespace-separated words of each query, so "予算 防衛"
    /// keeps a window holding both words apart, not only the literal string.
    #[default]
    AllQueries,
}

/// Split `text` into windows of `max_len` chars advancing by `max_len / 2`
///
/// The last window ends exactly at the end of the text. Text no longer than
/// `max_len` comes back as a single window.
pub fn split_windows(text: &str, max_len: usize) -> Vec<SpeechWindow> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let max_len = max_len.max(1);
    let step = (max_len / 2).max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max_len).min(len);
        windows.push(SpeechWindow {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });
        if end >= len {
            break;
        }
        start += step;
    }

    windows
}

/// True when every whitespace-separated term of `query` occurs in `text`
pub fn query_matches(text: &str, query: &str) -> bool {
    query.split_whitespace().all(|term| text.contains(term))
}

impl WindowFilter {
    pub fn keeps(&self, window_text: &str, queries: &[String]) -> bool {
        if queries.is_empty() {
            return true;
        }
        match self {
            WindowFilter::AnyQuery => queries.iter().any(|q| query_matches(window_text, q)),
            WindowFilter::AllQueries => queries.iter().all(|q| query_matches(window_text, q)),
        }
    }
}

/// Split `text` and keep the windows that `filter` accepts for `queries`
pub fn split_speech(
    text: &str,
    queries: &[String],
    max_len: usize,
    filter: WindowFilter,
) -> Vec<SpeechWindow> {
    let windows = split_windows(text, max_len);
    let total = windows.len();
    let kept: Vec<SpeechWindow> = windows
        .into_iter()
        .filter(|w| filter.keeps(&w.text, queries))
        .collect();

    tracing::debug!(
        "Split speech of {} chars into {} windows, kept {}",
        text.chars().count(),
        total,
        kept.len()
    );
    kept
}
