//! `agentdex sync` — one full catalog run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use agentdex_sync::{
    PublishDecision, RunOptions, RunResult, SourceReport, SuppressReason, SyncOrchestrator,
};

use super::{block_on, credentials, load_config};
use crate::GlobalOpts;

/// Arguments for `agentdex sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Decide whether the catalog would change without writing it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON run summary to this file.
    #[arg(long, value_name = "PATH")]
    pub summary_file: Option<PathBuf>,

    /// Write the catalog here instead of `generation.output_file`.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self, opts: &GlobalOpts) -> Result<()> {
        let config = load_config(opts)?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.generation.output_file.clone());

        let orchestrator =
            SyncOrchestrator::from_config(&config, &credentials(&config), Some(output.as_path()))
                .context("failed to prepare sync")?;
        let result = block_on(orchestrator.run_once(RunOptions {
            dry_run: self.dry_run,
        }))?
        .context("sync failed")?;

        if let Some(path) = &self.summary_file {
            fs::write(path, result.to_json()?)
                .with_context(|| format!("failed to write run summary to {}", path.display()))?;
        }
        if self.json {
            println!("{}", result.to_json()?);
        } else {
            print_summary(&result, &output);
        }

        if result.is_fatal() {
            bail!("every enabled source failed; catalog not published");
        }
        Ok(())
    }
}

fn print_summary(result: &RunResult, output: &Path) {
    for report in &result.sources {
        match report {
            SourceReport::Fetched {
                source,
                files,
                records,
                warnings,
            } => {
                let mut line = format!("{} {source}  {files} files, {records} agents", "✓".green());
                if *warnings > 0 {
                    line.push_str(&format!(", {}", format!("{warnings} skipped").yellow()));
                }
                println!("{line}");
            }
            SourceReport::Failed { source, error } => {
                println!("{} {source}  {}", "✗".red(), error.red());
            }
        }
    }
    for warning in &result.warnings {
        println!("  {} {}/{}: {}", "·".bright_black(), warning.source, warning.path, warning.message);
    }

    let output = output.display();
    let agents = result.record_count;
    match result.decision {
        PublishDecision::Publish => {
            println!("{} wrote {output} ({agents} agents)", "✎".green().bold())
        }
        PublishDecision::Unchanged => println!("· {output} is up to date ({agents} agents)"),
        PublishDecision::DryRun {
            would_publish: true,
        } => println!("[dry-run] ~ {output} would be updated ({agents} agents)"),
        PublishDecision::DryRun {
            would_publish: false,
        } => println!("[dry-run] · {output} is up to date ({agents} agents)"),
        PublishDecision::Suppressed {
            reason: SuppressReason::NoSourcesEnabled,
        } => println!("{}", "no sources enabled; nothing to do".yellow()),
        PublishDecision::Suppressed {
            reason: SuppressReason::AllSourcesFailed,
        } => println!("{}", "every source failed; keeping the existing catalog".red().bold()),
    }
}
