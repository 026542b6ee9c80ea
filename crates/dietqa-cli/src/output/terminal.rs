//! Terminal output formatter

use super::FormatOptions;
use dietqa_core::align::{split_markers, Chunk, CLOSE_MARKER, OPEN_MARKER};
use dietqa_core::{
    CostEstimate, QueryMatch, SearchSpeechesResult, SpeechRecord, StageSeconds, StageUsage,
    SummarizeSpeechResult,
};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const PREVIEW_CHARS: usize = 80;

pub fn format_scored(result: &SearchSpeechesResult, options: &FormatOptions) -> String {
    let mut output = String::new();
    output.push_str(&format!("Queries: {}\n\n", result.queries.join(" / ")));

    if result.speeches.is_empty() {
        output.push_str("No speeches found.\n");
    }

    for scored in result.speeches.iter().take(options.limit) {
        let record = &scored.speech.record;
        output.push_str(&format!("{:>3} {}\n", scored.score as u32, heading(record)));
        if let Some((start, end)) = scored.window {
            output.push_str(&format!(
                "    chars {}-{} of {}\n",
                start, end, scored.speech_length
            ));
        }
        output.push_str(&format!("    {}\n", record.speech_url));
        push_body(&mut output, &record.speech, options.full);
    }

    output.push('\n');
    output.push_str(&format_usage(&result.usage, &result.seconds, result.cost.as_ref()));
    output
}

pub fn format_matches(speeches: &[QueryMatch], options: &FormatOptions) -> String {
    let mut output = String::new();

    for speech in speeches.iter().take(options.limit) {
        output.push_str(&format!("{}\n", heading(&speech.record)));
        output.push_str(&format!("    matched: {}\n", speech.queries.join(" / ")));
        output.push_str(&format!("    {}\n", speech.record.speech_url));
        push_body(&mut output, &speech.record.speech, options.full);
    }

    if speeches.len() > options.limit {
        output.push_str(&format!("... {} more\n", speeches.len() - options.limit));
    }

    output
}

pub fn format_summary(result: &SummarizeSpeechResult) -> String {
    let mut output = String::new();
    output.push_str("Summary:\n");
    output.push_str(&format!("  {}\n\n", result.summary));
    output.push_str(&format_usage(&result.usage, &result.seconds, result.cost.as_ref()));
    output
}

fn heading(record: &SpeechRecord) -> String {
    let position = record.speaker_position.as_deref().unwrap_or_default();
    format!(
        "{} {} {} {} {}（{}）",
        record.date,
        record.name_of_house,
        record.name_of_meeting,
        record.issue,
        record.speaker,
        position
    )
}

fn push_body(output: &mut String, speech: &str, full: bool) {
    if full {
        for line in speech.lines() {
            output.push_str(&format!("    | {}\n", line));
        }
        return;
    }

    let first_line = speech.lines().next().unwrap_or_default();
    let preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if speech.chars().count() > preview.chars().count() {
        "…"
    } else {
        ""
    };
    output.push_str(&format!("    | {}{}\n", preview, ellipsis));
}

fn format_usage(usage: &StageUsage, seconds: &StageSeconds, cost: Option<&CostEstimate>) -> String {
    let mut output = String::new();

    for (stage, secs) in seconds {
        match usage.get(stage) {
            Some(u) => output.push_str(&format!(
                "{:<10} {:>7.2}s  in {:>7} tok / {:>7} chars  out {:>6} tok / {:>6} chars\n",
                stage.as_str(),
                secs,
                u.input.tokens,
                u.input.non_whitespace_characters,
                u.output.tokens,
                u.output.non_whitespace_characters
            )),
            None => output.push_str(&format!("{:<10} {:>7.2}s\n", stage.as_str(), secs)),
        }
    }

    if let Some(cost) = cost {
        output.push_str(&format!(
            "cost       ${:.4} (in ${:.4}, out ${:.4})\n",
            cost.total_usd, cost.input_usd, cost.output_usd
        ));
    }

    output
}

/// Print an annotated speech with the marked spans highlighted
pub fn print_annotated(annotated: &str) -> io::Result<()> {
    let choice = if std::env::var_os("NO_COLOR").is_some() {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let mut stdout = StandardStream::stdout(choice);
    write_annotated(&mut stdout, annotated)?;
    stdout.reset()?;
    writeln!(stdout)
}

pub fn write_annotated<W: WriteColor>(out: &mut W, annotated: &str) -> io::Result<()> {
    let mut highlight = ColorSpec::new();
    highlight.set_fg(Some(Color::Yellow)).set_bold(true).set_underline(true);

    for chunk in split_markers(annotated) {
        match chunk {
            Chunk::Marker(OPEN_MARKER) => out.set_color(&highlight)?,
            Chunk::Marker(CLOSE_MARKER) => out.reset()?,
            Chunk::Marker(_) => {}
            Chunk::Literal(text) => write!(out, "{}", text)?,
        }
    }

    Ok(())
}
