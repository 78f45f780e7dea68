//! Source registry — the validated, ordered list of configured sources.
//!
//! Registration order is significant: the catalog groups records by source in
//! exactly this order, so it is preserved verbatim from configuration.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::types::{Source, SourceId};

/// Immutable, validated set of sources for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Validate `sources` and build a registry.
    ///
    /// Fails with [`ConfigError::DuplicateSource`] when an `owner/name` appears
    /// twice, and with [`ConfigError::InvalidSource`] for empty or malformed
    /// entries. Entry numbers in errors are 1-based, matching the YAML list.
    pub fn new(sources: Vec<Source>) -> Result<Self, ConfigError> {
        let mut seen: HashMap<SourceId, usize> = HashMap::new();
        for (idx, source) in sources.iter().enumerate() {
            let index = idx + 1;
            validate_source(index, source)?;
            if let Some(first) = seen.insert(source.id(), index) {
                return Err(ConfigError::DuplicateSource {
                    id: source.id(),
                    first,
                    second: index,
                });
            }
        }
        Ok(Self { sources })
    }

    /// Enabled sources in registration order.
    pub fn list_enabled_sources(&self) -> Vec<&Source> {
        self.sources.iter().filter(|s| s.enabled).collect()
    }

    /// Every configured source, enabled or not, in registration order.
    pub fn all_sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn get(&self, id: &SourceId) -> Option<&Source> {
        self.sources.iter().find(|s| &s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn validate_source(index: usize, source: &Source) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSource { index, reason };

    for (field, value) in [("owner", &source.owner), ("name", &source.name)] {
        if value.trim().is_empty() {
            return Err(invalid(format!("'{field}' must not be empty")));
        }
        if value.contains('/') || value.chars().any(char::is_whitespace) {
            return Err(invalid(format!(
                "'{field}' must not contain '/' or whitespace (got '{value}')"
            )));
        }
    }
    if source.branch.trim().is_empty() {
        return Err(invalid("'branch' must not be empty".to_string()));
    }
    if source.paths.is_empty() {
        return Err(invalid(format!("'{}' lists no content paths", source.id())));
    }
    if source.paths.iter().any(|p| p.trim().is_empty()) {
        return Err(invalid(format!("'{}' has an empty content path", source.id())));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
