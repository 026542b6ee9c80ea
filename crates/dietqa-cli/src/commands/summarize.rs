//! Summarize command

use crate::app::{OutputFormat, SummarizeArgs};
use crate::output::{format_summary, terminal};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use dietqa_core::{drain_stream, Config, ModelSlot, Pipeline};
use std::io::Read;

pub async fn run(
    args: SummarizeArgs,
    config: &Config,
    slot: &ModelSlot,
    format: OutputFormat,
) -> Result<()> {
    let speech = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read speech from stdin")?;
            buf
        }
    };

    let model = slot.get().await?;
    let pipeline = Pipeline::from_config(config, model)?;

    let result = if args.stream {
        let mut reporter = ProgressReporter::new(format);
        let result = drain_stream(
            pipeline.summarize_and_annotate_stream(args.question.as_str(), speech),
            |s| reporter.report(s),
        )
        .await;
        reporter.finish();
        result?
    } else {
        pipeline
            .summarize_and_annotate(&args.question, &speech)
            .await?
    };

    print!("{}", format_summary(&result, format));
    if format == OutputFormat::Cli {
        if result.has_matching_section() {
            println!();
            terminal::print_annotated(&result.annotated)?;
        } else {
            println!("Nothing in the speech answers the question.");
        }
    }

    Ok(())
}
