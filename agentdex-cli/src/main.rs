//! agentdex — catalog of agent definitions published in GitHub repositories.
//!
//! # Usage
//!
//! ```text
//! agentdex [--config agentdex.yaml] [--verbose] sync [--dry-run] [--json] [--summary-file PATH] [--output PATH]
//! agentdex diff [--output PATH]
//! agentdex sources [--format table|json]
//! agentdex validate [--check-sources]
//! agentdex daemon [--interval 6h]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agentdex_core::config::DEFAULT_CONFIG_FILE;
use commands::{
    daemon::DaemonArgs, diff::DiffArgs, sources::SourcesArgs, sync::SyncArgs,
    validate::ValidateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "agentdex",
    version,
    about = "Build a Markdown catalog of agent definitions from GitHub repositories",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file.
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every enabled source and publish the catalog if it changed.
    Sync(SyncArgs),

    /// Show a unified diff of what sync would write.
    Diff(DiffArgs),

    /// List configured sources.
    Sources(SourcesArgs),

    /// Validate the configuration, optionally probing each source.
    Validate(ValidateArgs),

    /// Run sync on a fixed interval until interrupted.
    Daemon(DaemonArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::Sources(args) => args.run(&cli.global),
        Commands::Validate(args) => args.run(&cli.global),
        Commands::Daemon(args) => args.run(&cli.global),
    }
}
