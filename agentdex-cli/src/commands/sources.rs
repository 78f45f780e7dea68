//! `agentdex sources` — list configured sources.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use agentdex_core::Source;

use super::load_config;
use crate::GlobalOpts;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Arguments for `agentdex sources`.
#[derive(Args, Debug)]
pub struct SourcesArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct SourceJson<'a> {
    id: String,
    repo_url: String,
    branch: &'a str,
    paths: &'a [String],
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "paths")]
    paths: String,
    #[tabled(rename = "enabled")]
    enabled: String,
    #[tabled(rename = "description")]
    description: String,
}

impl SourcesArgs {
    pub fn run(self, opts: &GlobalOpts) -> Result<()> {
        let config = load_config(opts)?;
        match self.format {
            OutputFormat::Json => print_json(&config.sources),
            OutputFormat::Table => {
                print_table(&config.sources);
                Ok(())
            }
        }
    }
}

fn print_json(sources: &[Source]) -> Result<()> {
    let payload: Vec<SourceJson<'_>> = sources
        .iter()
        .map(|s| SourceJson {
            id: s.id().to_string(),
            repo_url: s.repo_url(),
            branch: &s.branch,
            paths: &s.paths,
            enabled: s.enabled,
            description: s.description.as_deref(),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sources JSON")?
    );
    Ok(())
}

fn print_table(sources: &[Source]) {
    let enabled = sources.iter().filter(|s| s.enabled).count();
    println!(
        "{} v{} | {} sources | {} enabled",
        "agentdex".bold(),
        env!("CARGO_PKG_VERSION"),
        sources.len(),
        enabled,
    );
    if sources.is_empty() {
        println!("No sources configured.");
        return;
    }

    let rows: Vec<SourceRow> = sources
        .iter()
        .map(|s| SourceRow {
            source: s.id().to_string(),
            branch: s.branch.clone(),
            paths: s.paths.join(", "),
            enabled: if s.enabled { "yes" } else { "no" }.to_string(),
            description: s.description.clone().unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
