//! `agentdex diff` — unified diff of what sync would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use agentdex_sync::SyncOrchestrator;

use super::{block_on, credentials, load_config};
use crate::GlobalOpts;

/// Arguments for `agentdex diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Compare against this file instead of `generation.output_file`.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl DiffArgs {
    pub fn run(self, opts: &GlobalOpts) -> Result<()> {
        let config = load_config(opts)?;
        let output = self
            .output
            .unwrap_or_else(|| config.generation.output_file.clone());

        let orchestrator =
            SyncOrchestrator::from_config(&config, &credentials(&config), Some(output.as_path()))
                .context("failed to prepare diff")?;
        let label = output.display().to_string();
        let diff = block_on(orchestrator.diff(&label))?
            .with_context(|| format!("diff failed for {label}"))?;

        match diff {
            None => println!("No differences for {label}."),
            Some(diff) => {
                print!("{diff}");
                if !diff.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(())
    }
}
