//! `agentdex daemon` — scheduled sync in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use agentdex_daemon::{format_interval, parse_interval, start_blocking, DEFAULT_INTERVAL};
use agentdex_sync::SyncOrchestrator;

use super::{credentials, load_config};
use crate::GlobalOpts;

/// Arguments for `agentdex daemon`.
#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Time between runs: `30m`, `6h`, `1d`.
    #[arg(long, value_name = "INTERVAL")]
    pub interval: Option<String>,

    /// Write the catalog here instead of `generation.output_file`.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl DaemonArgs {
    pub fn run(self, opts: &GlobalOpts) -> Result<()> {
        let interval = match self.interval.as_deref() {
            Some(raw) => parse_interval(raw)?,
            None => DEFAULT_INTERVAL,
        };
        let config = load_config(opts)?;
        let orchestrator =
            SyncOrchestrator::from_config(&config, &credentials(&config), self.output.as_deref())
                .context("failed to prepare daemon")?;

        tracing::info!(
            interval = %format_interval(interval),
            config = %opts.config.display(),
            "starting daemon",
        );
        let stats = start_blocking(orchestrator, interval).context("daemon exited with error")?;
        println!(
            "daemon stopped after {} runs ({} published, {} skipped while locked, {} failed)",
            stats.runs, stats.published, stats.skipped_locked, stats.failed
        );
        Ok(())
    }
}
