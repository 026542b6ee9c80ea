//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dietqa")]
#[command(
    author,
    version,
    about = "Ask questions of the National Diet speech archive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find and score speeches relevant to a question
    Ask(AskArgs),

    /// Summarize one speech against a question and mark the relevant parts
    Summarize(SummarizeArgs),

    /// Query the speech archive directly
    Search(SearchArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct AskArgs {
    /// Question
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Number of results shown
    #[arg(short = 'n', default_value = "10")]
    pub limit: usize,

    /// Speeches kept after the archive search
    #[arg(long)]
    pub max_count: Option<usize>,

    /// Window size in characters for long speeches
    #[arg(long)]
    pub max_speech_length: Option<usize>,

    /// Also summarize the top N results
    #[arg(long, value_name = "N")]
    pub summarize: Option<usize>,

    /// Show full speech text
    #[arg(long)]
    pub full: bool,

    /// Report each stage while the run progresses
    #[arg(long)]
    pub stream: bool,
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Question the summary should answer
    #[arg(short, long)]
    pub question: String,

    /// File holding the speech text; stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Report each stage while the run progresses
    #[arg(long)]
    pub stream: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Exact-match queries; space-separated words inside one query are ANDed
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Records requested per query
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Send all queries at once
    #[arg(long)]
    pub concurrent: bool,

    /// Show full speech text
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print only the config file path
    #[arg(long)]
    pub path: bool,

    /// Write a config file with default values (the API key is left out)
    #[arg(long, conflicts_with = "path")]
    pub init: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
