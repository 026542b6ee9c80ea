//! Progress reporting for streaming runs

use crate::app::OutputFormat;
use dietqa_core::ProgressSnapshot;
use std::io::{self, Write};
use std::time::Instant;

/// Prints pipeline snapshots to stderr as they arrive
///
/// Terminal mode rewrites one status line; JSON mode emits one object per line.
pub struct ProgressReporter {
    format: OutputFormat,
    started: Instant,
    events: usize,
}

impl ProgressReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            started: Instant::now(),
            events: 0,
        }
    }

    pub fn report(&mut self, snapshot: &ProgressSnapshot) {
        self.events += 1;
        match self.format {
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(snapshot) {
                    eprintln!("{}", line);
                }
            }
            OutputFormat::Cli => {
                let msg = format!(
                    "[{:>5.1}s] {}",
                    self.started.elapsed().as_secs_f64(),
                    snapshot.progress
                );
                eprint!("\r{:<50}", msg);
                io::stderr().flush().ok();
            }
        }
    }

    pub fn finish(&self) {
        if self.format == OutputFormat::Cli && self.events > 0 {
            eprintln!(
                "\rDone in {:.1}s                              ",
                self.started.elapsed().as_secs_f64()
            );
        }
    }
}
