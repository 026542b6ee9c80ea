//! dietqa CLI
//!
//! Question answering over the National Diet speech archive.

use anyhow::Result;
use clap::Parser;
use dietqa_core::error::exit_codes;
use dietqa_core::{Config, DietQaError, ModelSlot};

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let slot = ModelSlot::new(config.model.clone());

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, &config, &slot, cli.format).await,
        Commands::Summarize(args) => {
            commands::summarize::run(args, &config, &slot, cli.format).await
        }
        Commands::Search(args) => commands::search::run(args, &config, cli.format).await,
        Commands::Config(args) => commands::config::run(args, &config, cli.format),
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<DietQaError>()
        .map(DietQaError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR)
}
