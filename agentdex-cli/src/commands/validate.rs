//! `agentdex validate` — configuration check, optionally probing each source.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use futures::stream::{self, StreamExt};

use agentdex_core::CatalogConfig;
use agentdex_extractor::extract_all;
use agentdex_fetch::ContentFetcher;
use agentdex_renderer::Renderer;

use super::{block_on, credentials, load_config};
use crate::GlobalOpts;

/// Arguments for `agentdex validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Fetch every enabled source and report what it yields.
    #[arg(long)]
    pub check_sources: bool,
}

impl ValidateArgs {
    pub fn run(self, opts: &GlobalOpts) -> Result<()> {
        let config = load_config(opts)?;
        Renderer::with_template_dir(
            config.generation.title.clone(),
            config.generation.template_dir.as_deref(),
        )
        .context("catalog template is invalid")?;

        let enabled = config.sources.iter().filter(|s| s.enabled).count();
        println!(
            "{} {}: {} sources ({} enabled)",
            "✓".green(),
            opts.config.display(),
            config.sources.len(),
            enabled,
        );

        if self.check_sources {
            check_sources(&config)?;
        }
        Ok(())
    }
}

fn check_sources(config: &CatalogConfig) -> Result<()> {
    let fetcher = ContentFetcher::from_config(&config.fetch, &credentials(config))
        .context("cannot check sources")?;
    let enabled: Vec<_> = config.sources.iter().filter(|s| s.enabled).collect();

    let results = block_on(
        stream::iter(enabled.iter().copied())
            .map(|source| {
                let fetcher = &fetcher;
                async move { (source, fetcher.fetch(source).await) }
            })
            .buffered(config.fetch.source_concurrency.max(1))
            .collect::<Vec<_>>(),
    )?;

    let mut failed = 0;
    for (source, result) in results {
        match result {
            Ok(files) => {
                let extraction = extract_all(&files);
                println!(
                    "{} {}  {} files, {} agents, {} skipped",
                    "✓".green(),
                    source.id(),
                    files.len(),
                    extraction.records.len(),
                    extraction.warnings.len(),
                );
            }
            Err(err) if err.is_fatal() => {
                return Err(err).context("authentication failed while checking sources");
            }
            Err(err) => {
                failed += 1;
                println!("{} {}  {}", "✗".red(), source.id(), err.to_string().red());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} enabled sources could not be fetched", enabled.len());
    }
    Ok(())
}
