//! YAML frontmatter splitting, parsing and key-level editing.
//!
//! Edits never re-serialize the whole block: only the lines belonging to
//! the touched top-level key are rewritten, so every other key keeps its
//! exact bytes and position.

use crate::error::{Result, VaultError};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

/// Frontmatter extraction result.
#[derive(Debug, Clone)]
pub struct FrontmatterSplit<'a> {
    /// The raw YAML string (without delimiters or its final newline).
    pub yaml: Option<&'a str>,
    /// Byte range of `yaml` within the content.
    pub yaml_range: Option<Range<usize>>,
    /// The content after the closing delimiter line.
    pub body: &'a str,
    /// Byte offset where `body` starts.
    pub body_offset: usize,
    /// Line number where the body starts (1-indexed).
    pub body_start_line: usize,
}

impl<'a> FrontmatterSplit<'a> {
    fn without(content: &'a str) -> Self {
        Self {
            yaml: None,
            yaml_range: None,
            body: content,
            body_offset: 0,
            body_start_line: 1,
        }
    }
}

/// Split content into frontmatter and body.
///
/// Frontmatter must open with `---` on the very first line and close with
/// a `---` line; otherwise the whole content is body.
pub fn split_frontmatter(content: &str) -> FrontmatterSplit<'_> {
    let yaml_start = if content.starts_with("---\n") {
        4
    } else if content.starts_with("---\r\n") {
        5
    } else {
        return FrontmatterSplit::without(content);
    };

    let remaining = &content[yaml_start..];

    // (start of yaml end, start of closing delimiter line)
    let closing = if remaining.starts_with("---") {
        Some((yaml_start, yaml_start))
    } else {
        remaining
            .find("\n---\n")
            .or_else(|| remaining.find("\n---\r\n"))
            .or_else(|| remaining.ends_with("\n---").then(|| remaining.len() - 4))
            .map(|pos| {
                let yaml_end = yaml_start + pos;
                let yaml_end = if content[..yaml_end].ends_with('\r') {
                    yaml_end - 1
                } else {
                    yaml_end
                };
                (yaml_end, yaml_start + pos + 1)
            })
    };

    let Some((yaml_end, delimiter_start)) = closing else {
        return FrontmatterSplit::without(content);
    };

    let after_delimiter = delimiter_start + 3;
    let rest = &content[after_delimiter..];
    let body_offset = if rest.starts_with('\n') {
        after_delimiter + 1
    } else if rest.starts_with("\r\n") {
        after_delimiter + 2
    } else if rest.is_empty() {
        after_delimiter
    } else {
        // `---text` is not a delimiter line
        return FrontmatterSplit::without(content);
    };

    FrontmatterSplit {
        yaml: Some(&content[yaml_start..yaml_end]),
        yaml_range: Some(yaml_start..yaml_end),
        body: &content[body_offset..],
        body_offset,
        body_start_line: content[..body_offset].matches('\n').count() + 1,
    }
}

/// Extract frontmatter as a raw YAML string.
pub fn extract_frontmatter(content: &str) -> Option<&str> {
    split_frontmatter(content).yaml
}

/// Parse a raw YAML block into a mapping. An empty block is an empty mapping.
pub fn parse_yaml_mapping(yaml: &str, path: &Path) -> Result<Mapping> {
    let invalid = |message: String| VaultError::InvalidFrontmatter {
        path: path.to_path_buf(),
        message,
    };
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| invalid(e.to_string()))?;
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(invalid(format!(
            "expected a key/value mapping, found {}",
            yaml_type_name(&other)
        ))),
    }
}

/// Parse frontmatter with path context for error messages.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<Option<Mapping>> {
    extract_frontmatter(content)
        .map(|yaml| parse_yaml_mapping(yaml, path))
        .transpose()
}

fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// A top-level key line: `key:`, `"key":` or `'key':` at column 0.
static TOP_LEVEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:"([^"]*)"|'([^']*)'|([^\s#'"\-][^:]*?))\s*:(?:\s|$)"#).unwrap()
});

/// Byte range (within `yaml`) of the lines that make up a top-level key.
fn key_block(yaml: &str, key: &str) -> Option<Range<usize>> {
    let mut offset = 0;
    let mut found: Option<usize> = None;

    for line in yaml.split_inclusive('\n') {
        if let Some(start) = found {
            let continues = line.starts_with(' ')
                || line.starts_with('\t')
                || line.starts_with("- ")
                || line.trim_end() == "-";
            if !continues {
                return Some(start..offset);
            }
        } else if let Some(cap) = TOP_LEVEL_KEY.captures(line) {
            let name = cap
                .get(1)
                .or_else(|| cap.get(2))
                .or_else(|| cap.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            if name == key {
                found = Some(offset);
            }
        }
        offset += line.len();
    }

    found.map(|start| start..yaml.len())
}

/// Serialize a single `key: value` entry as block YAML (ends with a newline).
pub fn serialize_entry(key: &str, value: &Value) -> Result<String> {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), value.clone());
    let text = serde_yaml::to_string(&Value::Mapping(map))?;
    Ok(text)
}

/// Set `key` in a raw YAML block, preserving every other line byte-for-byte.
///
/// An existing key is rewritten in place; a new key is appended at the end.
pub fn set_yaml_key(yaml: &str, key: &str, value: &Value) -> Result<String> {
    let entry = serialize_entry(key, value)?;
    let mut out = String::with_capacity(yaml.len() + entry.len());

    match key_block(yaml, key) {
        Some(range) => {
            out.push_str(&yaml[..range.start]);
            // keep the old block's line-ending convention at the seam
            let old_had_newline = yaml[range.clone()].ends_with('\n');
            if old_had_newline {
                out.push_str(&entry);
            } else {
                out.push_str(entry.trim_end_matches('\n'));
            }
            out.push_str(&yaml[range.end..]);
        }
        None => {
            out.push_str(yaml);
            if !yaml.is_empty() && !yaml.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(entry.trim_end_matches('\n'));
        }
    }

    Ok(out)
}

/// Remove `key` from a raw YAML block. Returns `None` when the key is absent.
pub fn remove_yaml_key(yaml: &str, key: &str) -> Option<String> {
    let range = key_block(yaml, key)?;
    let mut out = String::with_capacity(yaml.len());
    out.push_str(&yaml[..range.start]);
    out.push_str(&yaml[range.end..]);
    if range.end == yaml.len() && out.ends_with('\n') {
        out.pop();
    }
    Some(out)
}

/// Replace (or create) the frontmatter block of `content` with `new_yaml`.
pub fn replace_frontmatter(content: &str, new_yaml: &str) -> String {
    let split = split_frontmatter(content);
    let new_yaml = new_yaml.trim_end_matches('\n');

    match split.yaml_range {
        Some(range) if range.is_empty() => {
            let mut out = String::with_capacity(content.len() + new_yaml.len() + 1);
            out.push_str(&content[..range.start]);
            if !new_yaml.is_empty() {
                out.push_str(new_yaml);
                out.push('\n');
            }
            out.push_str(&content[range.end..]);
            out
        }
        Some(range) => {
            let mut out = String::with_capacity(content.len() + new_yaml.len());
            out.push_str(&content[..range.start]);
            if new_yaml.is_empty() {
                // drop the newline that separated the yaml from the closing line
                let after = &content[range.end..];
                out.push_str(after.strip_prefix('\n').unwrap_or(after));
            } else {
                out.push_str(new_yaml);
                out.push_str(&content[range.end..]);
            }
            out
        }
        None => format!("---\n{}\n---\n{}", new_yaml, content),
    }
}
