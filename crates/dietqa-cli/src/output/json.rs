//! JSON output formatter

use super::FormatOptions;
use dietqa_core::{QueryMatch, SearchSpeechesResult, SummarizeSpeechResult};

pub fn format_scored(result: &SearchSpeechesResult, options: &FormatOptions) -> String {
    let mut value = serde_json::to_value(result).unwrap_or_default();
    if let Some(speeches) = value.get_mut("speeches").and_then(|v| v.as_array_mut()) {
        speeches.truncate(options.limit);
    }
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_matches(speeches: &[QueryMatch], options: &FormatOptions) -> String {
    let shown = &speeches[..speeches.len().min(options.limit)];
    serde_json::to_string_pretty(shown).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

pub fn format_summary(result: &SummarizeSpeechResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string()) + "\n"
}
