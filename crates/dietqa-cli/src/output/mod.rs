//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use dietqa_core::{QueryMatch, SearchSpeechesResult, SummarizeSpeechResult};

/// Format options
pub struct FormatOptions {
    /// Maximum entries shown
    pub limit: usize,
    pub full: bool,
}

/// Format scored speeches
pub fn format_scored(
    result: &SearchSpeechesResult,
    format: OutputFormat,
    options: &FormatOptions,
) -> String {
    match format {
        OutputFormat::Json => json::format_scored(result, options),
        OutputFormat::Cli => terminal::format_scored(result, options),
    }
}

/// Format raw archive hits
pub fn format_matches(
    speeches: &[QueryMatch],
    format: OutputFormat,
    options: &FormatOptions,
) -> String {
    match format {
        OutputFormat::Json => json::format_matches(speeches, options),
        OutputFormat::Cli => terminal::format_matches(speeches, options),
    }
}

/// Format a summary without the annotated speech
pub fn format_summary(result: &SummarizeSpeechResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_summary(result),
        OutputFormat::Cli => terminal::format_summary(result),
    }
}
