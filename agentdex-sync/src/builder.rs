//! Merge per-source extraction results into a [`Catalog`].
//!
//! Order is fixed by configuration, never by fetch completion: sources follow
//! registry order, records inside a source follow natural title order.

use std::cmp::Ordering;
use std::collections::HashMap;

use agentdex_core::types::{AgentRecord, Catalog, SourceId, SourceStatus, SourceSummary};
use agentdex_core::SourceRegistry;

/// What one enabled source produced this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Records in extraction order; may contain duplicate paths.
    Fetched(Vec<AgentRecord>),
    Failed(String),
}

/// Build the catalog. Enabled sources missing from `outcomes` are treated as
/// failed.
pub fn build(registry: &SourceRegistry, outcomes: &HashMap<SourceId, SourceOutcome>) -> Catalog {
    let mut catalog = Catalog::default();

    for source in registry.all_sources() {
        let id = source.id();
        let status = if !source.enabled {
            SourceStatus::Disabled
        } else {
            match outcomes.get(&id) {
                Some(SourceOutcome::Fetched(records)) => {
                    let records = order_source_records(records);
                    let count = records.len();
                    catalog.records.extend(records);
                    SourceStatus::Ok { records: count }
                }
                Some(SourceOutcome::Failed(reason)) => SourceStatus::Degraded {
                    reason: reason.clone(),
                },
                None => SourceStatus::Degraded {
                    reason: "no result".to_string(),
                },
            }
        };

        catalog.sources.push(SourceSummary {
            repo_url: source.repo_url(),
            description: source.description.clone(),
            enabled: source.enabled,
            status,
            id,
        });
    }

    catalog
}

/// Deduplicate by path (last wins, keeping its position) and sort by title.
fn order_source_records(records: &[AgentRecord]) -> Vec<AgentRecord> {
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        last_index.insert(record.path.as_str(), idx);
    }
    let mut unique: Vec<AgentRecord> = records
        .iter()
        .enumerate()
        .filter(|(idx, r)| last_index.get(r.path.as_str()) == Some(idx))
        .map(|(_, r)| r.clone())
        .collect();
    unique.sort_by(|a, b| natural_cmp(&a.title, &b.title).then_with(|| a.path.cmp(&b.path)));
    unique
}

// ---------------------------------------------------------------------------
// Natural ordering
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(String),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(first) = rest.chars().next() {
        let digit = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        out.push(if digit {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head.to_lowercase())
        });
        rest = tail;
    }
    out
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Case-insensitive comparison where digit runs compare numerically:
/// `Agent 2` < `agent 10`. Falls back to a byte comparison so distinct
/// strings never compare equal.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);
    for (x, y) in left.iter().zip(right.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use agentdex_core::Source;

    fn rec(source: &str, path: &str, title: &str) -> AgentRecord {
        AgentRecord {
            source: SourceId::from(source),
            path: path.to_string(),
            title: title.to_string(),
            summary: String::new(),
            link: format!("https://github.com/{source}/blob/main/{path}"),
        }
    }

    fn titles(catalog: &Catalog) -> Vec<&str> {
        catalog.records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn natural_order_is_numeric_and_case_insensitive() {
        let mut names = vec!["agent 10", "Agent 2", "beta", "Alpha", "agent 1"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["agent 1", "Agent 2", "agent 10", "Alpha", "beta"]);
        assert_eq!(natural_cmp("x01", "x1"), Ordering::Greater);
        assert_ne!(natural_cmp("abc", "ABC"), Ordering::Equal);
    }

    #[test]
    fn sources_keep_registry_order_and_records_sort_within() {
        let registry = SourceRegistry::new(vec![Source::new("zeta", "agents"), Source::new("alpha", "agents")])
            .unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert(
            SourceId::from("zeta/agents"),
            SourceOutcome::Fetched(vec![rec("zeta/agents", "b.md", "Zed"), rec("zeta/agents", "a.md", "Ant")]),
        );
        outcomes.insert(
            SourceId::from("alpha/agents"),
            SourceOutcome::Fetched(vec![rec("alpha/agents", "c.md", "Aardvark")]),
        );

        let catalog = build(&registry, &outcomes);
        assert_eq!(titles(&catalog), vec!["Ant", "Zed", "Aardvark"]);
        assert_eq!(catalog.sources[0].id, SourceId::from("zeta/agents"));
        assert_eq!(catalog.sources[0].status, SourceStatus::Ok { records: 2 });
    }

    #[test]
    fn duplicate_paths_keep_last_extracted() {
        let registry = SourceRegistry::new(vec![Source::new("acme", "agents")]).unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert(
            SourceId::from("acme/agents"),
            SourceOutcome::Fetched(vec![
                rec("acme/agents", "x.md", "Old Title"),
                rec("acme/agents", "y.md", "Other"),
                rec("acme/agents", "x.md", "New Title"),
            ]),
        );
        let catalog = build(&registry, &outcomes);
        assert_eq!(titles(&catalog), vec!["New Title", "Other"]);
    }

    #[test]
    fn failed_and_disabled_sources_are_listed_without_records() {
        let mut disabled = Source::new("off", "agents");
        disabled.enabled = false;
        let registry = SourceRegistry::new(vec![
            Source::new("ok", "agents"),
            Source::new("bad", "agents"),
            disabled,
        ])
        .unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert(
            SourceId::from("ok/agents"),
            SourceOutcome::Fetched(vec![rec("ok/agents", "a.md", "A")]),
        );
        outcomes.insert(SourceId::from("bad/agents"), SourceOutcome::Failed("HTTP 500".into()));

        let catalog = build(&registry, &outcomes);
        assert_eq!(catalog.record_count(), 1);
        assert_eq!(catalog.sources.len(), 3);
        assert_eq!(
            catalog.sources[1].status,
            SourceStatus::Degraded { reason: "HTTP 500".into() }
        );
        assert_eq!(catalog.sources[2].status, SourceStatus::Disabled);
        assert_eq!(catalog.degraded().count(), 1);
    }

    #[test]
    fn title_ties_break_on_path() {
        let registry = SourceRegistry::new(vec![Source::new("acme", "agents")]).unwrap();
        let mut outcomes = HashMap::new();
        outcomes.insert(
            SourceId::from("acme/agents"),
            SourceOutcome::Fetched(vec![rec("acme/agents", "z/helper.md", "Helper"), rec("acme/agents", "a/helper.md", "Helper")]),
        );
        let catalog = build(&registry, &outcomes);
        let paths: Vec<_> = catalog.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a/helper.md", "z/helper.md"]);
    }
}
