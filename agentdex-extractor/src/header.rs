//! Leading `---` header block parser.
//!
//! Agent files carry a small key/value block at the top:
//!
//! ```text
//! ---
//! name: code-refactorer
//! description: Use this agent when you need to improve existing code...
//! tools: Read, Edit
//! ---
//! ```
//!
//! The block is tried as a YAML mapping first. Real-world descriptions often
//! contain unquoted `: ` sequences that strict YAML rejects, so a line-based
//! `key: value` scan is used as the fallback. Neither path ever fails: callers
//! get `Option<Header>` and branch on presence.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Parsed header fields. Keys are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    fields: BTreeMap<String, String>,
}

impl Header {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where the header block sits in a document, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderBlock<'a> {
    /// First non-blank line is not a delimiter.
    Absent,
    /// Opening delimiter without a closing one.
    Unterminated,
    Found(&'a str),
}

const DELIMITER: &str = "---";

/// Locate the header block: the first non-blank line must be `---`, the block
/// ends at the next line that is exactly `---`.
pub(crate) fn locate(text: &str) -> HeaderBlock<'_> {
    let mut offset = 0;
    let mut lines = text.split_inclusive('\n');

    let opening = loop {
        match lines.next() {
            None => return HeaderBlock::Absent,
            Some(line) => {
                offset += line.len();
                if line.trim().is_empty() {
                    continue;
                }
                break line;
            }
        }
    };
    if opening.trim_end() != DELIMITER {
        return HeaderBlock::Absent;
    }

    let start = offset;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return HeaderBlock::Found(&text[start..offset]);
        }
        offset += line.len();
    }
    HeaderBlock::Unterminated
}

/// Parse the leading header block of `text`. Returns `None` when there is no
/// complete block.
pub fn parse_header(text: &str) -> Option<Header> {
    match locate(text) {
        HeaderBlock::Found(block) => Some(parse_block(block)),
        HeaderBlock::Absent | HeaderBlock::Unterminated => None,
    }
}

pub(crate) fn parse_block(block: &str) -> Header {
    parse_strict(block).unwrap_or_else(|| parse_lenient(block))
}

fn parse_strict(block: &str) -> Option<Header> {
    if block.trim().is_empty() {
        return Some(Header::default());
    }
    let Value::Mapping(map) = serde_yaml::from_str::<Value>(block).ok()? else {
        return None;
    };
    let mut fields = BTreeMap::new();
    for (key, value) in map {
        let Some(key) = scalar_to_string(&key) else { continue };
        let value = match &value {
            Value::Sequence(items) => items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", "),
            other => match scalar_to_string(other) {
                Some(v) => v,
                None => continue,
            },
        };
        fields.insert(key.to_ascii_lowercase(), value);
    }
    Some(Header { fields })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_lenient(block: &str) -> Header {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if indented {
            if let Some(value) = current.as_ref().and_then(|k| fields.get_mut(k)) {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            current = None;
            continue;
        };
        let key = key.trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            current = None;
            continue;
        }

        let value = value.trim();
        let value = if matches!(value, "|" | ">" | "|-" | ">-" | "|+" | ">+") {
            String::new()
        } else {
            strip_quotes(value).to_string()
        };
        let key = key.to_ascii_lowercase();
        fields.insert(key.clone(), value);
        current = Some(key);
    }

    Header { fields }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
