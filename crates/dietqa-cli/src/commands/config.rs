//! Config command

use crate::app::{ConfigArgs, OutputFormat};
use anyhow::{bail, Result};
use dietqa_core::Config;

pub fn run(args: ConfigArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let path = Config::resolved_path();

    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    if args.init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        let mut fresh = Config::default();
        fresh.model.api_key = None;
        fresh.save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let redacted = config.redacted();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&redacted)?),
        OutputFormat::Cli => {
            let state = if path.exists() { "" } else { " (not found, using defaults)" };
            println!("# {}{}", path.display(), state);
            print!("{}", serde_yaml::to_string(&redacted)?);
        }
    }
    Ok(())
}
