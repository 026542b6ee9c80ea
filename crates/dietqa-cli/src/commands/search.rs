//! Search command: query the archive without the model

use crate::app::{OutputFormat, SearchArgs};
use crate::output::{format_matches, FormatOptions};
use anyhow::Result;
use dietqa_core::{search_speeches, Config, KokkaiClient, SearchOptions};

pub async fn run(args: SearchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let client = KokkaiClient::new(&config.search)?;
    let options = SearchOptions {
        max_records: args.max_records.unwrap_or(config.search.max_records),
        concurrent: args.concurrent || config.search.concurrent,
    };

    let outcome = search_speeches(&client, &args.queries, &options).await?;
    tracing::info!(
        "{} speeches from {} in {:.2}s",
        outcome.speeches.len(),
        client.base_url(),
        outcome.seconds
    );

    let format_opts = FormatOptions {
        limit: outcome.speeches.len(),
        full: args.full,
    };
    print!("{}", format_matches(&outcome.speeches, format, &format_opts));
    Ok(())
}
