//! `agentdex.yaml` configuration.
//!
//! ```yaml
//! sources:
//!   - owner: vijaythecoder
//!     name: awesome-claude-agents
//!     branch: main
//!     paths: [agents]
//!     description: Orchestrated sub-agent team
//! logging:
//!   level: info
//! generation:
//!   output_file: README.md
//!   title: Awesome Claude Agents
//! fetch:
//!   source_concurrency: 4
//!   file_concurrency: 4
//! ```
//!
//! Every section except `sources` is optional; missing fields take defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::SourceRegistry;
use crate::types::Source;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "agentdex.yaml";

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default, alias = "agent_sources")]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Where the rendered catalog is persisted.
    pub output_file: PathBuf,
    /// Document heading.
    pub title: String,
    /// Optional template override directory. Files shadow the embedded ones
    /// by relative path: `catalog.md.tera` for the whole layout, or
    /// `_partials/sources.tera` / `_partials/agents.tera` for one table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("README.md"),
            title: "Awesome Claude Agents".to_string(),
            template_dir: None,
        }
    }
}

/// Network tuning. Durations are plain integers to keep the YAML readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub api_base: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    pub user_agent: String,
    pub source_concurrency: usize,
    pub file_concurrency: usize,
    pub request_timeout_secs: u64,
    pub source_timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// File extensions (without dot) that count as agent files in a listing.
    pub extensions: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            user_agent: concat!("agentdex/", env!("CARGO_PKG_VERSION")).to_string(),
            source_concurrency: 4,
            file_concurrency: 4,
            request_timeout_secs: 30,
            source_timeout_secs: 120,
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            extensions: vec!["md".to_string()],
        }
    }
}

impl CatalogConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
    /// path + line context) if malformed YAML, and registry/setting errors if
    /// the content is structurally invalid.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&contents, path)
    }

    /// Parse and validate YAML text; `origin` is only used in error messages.
    pub fn from_yaml(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: CatalogConfig =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                path: origin.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check tuning values and source entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &'static str, value: u64| {
            if value == 0 {
                Err(ConfigError::InvalidSetting {
                    key,
                    reason: "must be greater than zero".to_string(),
                })
            } else {
                Ok(())
            }
        };
        positive("fetch.source_concurrency", self.fetch.source_concurrency as u64)?;
        positive("fetch.file_concurrency", self.fetch.file_concurrency as u64)?;
        positive("fetch.request_timeout_secs", self.fetch.request_timeout_secs)?;
        positive("fetch.source_timeout_secs", self.fetch.source_timeout_secs)?;
        positive("fetch.max_attempts", u64::from(self.fetch.max_attempts))?;
        if self.fetch.base_delay_ms > self.fetch.max_delay_ms {
            return Err(ConfigError::InvalidSetting {
                key: "fetch.base_delay_ms",
                reason: "must not exceed fetch.max_delay_ms".to_string(),
            });
        }
        if self.fetch.extensions.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "fetch.extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        self.registry().map(|_| ())
    }

    /// Build the validated [`SourceRegistry`].
    pub fn registry(&self) -> Result<SourceRegistry, ConfigError> {
        SourceRegistry::new(self.sources.clone())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
