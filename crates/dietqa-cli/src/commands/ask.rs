//! Ask command: search, score, and optionally summarize

use crate::app::{AskArgs, OutputFormat};
use crate::output::{format_scored, format_summary, terminal, FormatOptions};
use crate::progress::ProgressReporter;
use anyhow::Result;
use dietqa_core::{
    drain_stream, Config, ModelSlot, Pipeline, ScoredSpeech, SearchSpeechesResult,
    SummarizeSpeechResult,
};
use serde::Serialize;

/// JSON shape when summaries are requested alongside the scores
#[derive(Serialize)]
struct AskOutput<'a> {
    result: &'a SearchSpeechesResult,
    summaries: Vec<SpeechSummary<'a>>,
}

#[derive(Serialize)]
struct SpeechSummary<'a> {
    speech_id: &'a str,
    window: Option<(usize, usize)>,
    #[serde(flatten)]
    summary: SummarizeSpeechResult,
}

pub async fn run(
    args: AskArgs,
    config: &Config,
    slot: &ModelSlot,
    format: OutputFormat,
) -> Result<()> {
    let question = args.question.join(" ");

    let mut config = config.clone();
    if let Some(max_count) = args.max_count {
        config.pipeline.max_count = max_count;
    }
    if let Some(max_len) = args.max_speech_length {
        config.pipeline.max_speech_length = max_len;
    }

    let model = slot.get().await?;
    let pipeline = Pipeline::from_config(&config, model)?;
    tracing::info!("Asking {} with {}", question, pipeline.model_info().name);

    let result = if args.stream {
        let mut reporter = ProgressReporter::new(format);
        let result = drain_stream(pipeline.search_and_score_stream(question.as_str()), |s| {
            reporter.report(s)
        })
        .await;
        reporter.finish();
        result?
    } else {
        pipeline.search_and_score(&question).await?
    };

    let options = FormatOptions {
        limit: args.limit,
        full: args.full,
    };

    let Some(top) = args.summarize else {
        print!("{}", format_scored(&result, format, &options));
        return Ok(());
    };

    let mut summaries = Vec::new();
    for scored in result.speeches.iter().take(top) {
        let summary = pipeline
            .summarize_and_annotate(&question, &scored.speech.record.speech)
            .await?;
        summaries.push(SpeechSummary {
            speech_id: &scored.speech.record.speech_id,
            window: scored.window,
            summary,
        });
    }

    match format {
        OutputFormat::Json => {
            let output = AskOutput {
                result: &result,
                summaries,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            print!("{}", format_scored(&result, format, &options));
            for (scored, entry) in result.speeches.iter().zip(&summaries) {
                print_summary(scored, &entry.summary, format)?;
            }
        }
    }

    Ok(())
}

fn print_summary(
    scored: &ScoredSpeech,
    summary: &SummarizeSpeechResult,
    format: OutputFormat,
) -> Result<()> {
    println!();
    println!(
        "== {} {} ==",
        scored.speech.record.speaker, scored.speech.record.speech_url
    );
    print!("{}", format_summary(summary, format));
    if summary.has_matching_section() {
        terminal::print_annotated(&summary.annotated)?;
    }
    Ok(())
}
