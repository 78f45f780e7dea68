pub mod daemon;
pub mod diff;
pub mod sources;
pub mod sync;
pub mod validate;

use std::future::Future;

use anyhow::{Context, Result};

use agentdex_core::CatalogConfig;
use agentdex_fetch::EnvCredentials;

use crate::GlobalOpts;

/// Load `--config` and install the log subscriber it asks for.
pub fn load_config(opts: &GlobalOpts) -> Result<CatalogConfig> {
    let config = CatalogConfig::load_at(&opts.config)
        .with_context(|| format!("failed to load configuration from {}", opts.config.display()))?;
    let level = if opts.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    agentdex_daemon::init_tracing(level, opts.log_json);
    Ok(config)
}

pub fn credentials(config: &CatalogConfig) -> EnvCredentials {
    EnvCredentials::new(config.fetch.token_env.clone())
}

pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
