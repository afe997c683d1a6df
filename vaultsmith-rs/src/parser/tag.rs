//! Tag parsing: header `tags` field and inline `#tag/subtag` markers.

use crate::parser::code_block::{find_code_ranges, is_in_code, line_of, line_start_of};
use crate::types::{Tag, TagOrigin};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

// Preceded by start or a non-word, non-& char; must not start with a digit.
// The regex crate has no lookaround, so the following char is checked by hand.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w&])#([a-zA-Z_][\w/-]*)").unwrap());

/// Parse inline `#tag` markers, skipping code, wikilinks, URLs and link destinations.
pub fn parse_inline_tags(content: &str) -> Vec<Tag> {
    let code_ranges = find_code_ranges(content);
    let mut tags = Vec::new();

    for cap in TAG.captures_iter(content) {
        let Some(name) = cap.get(1) else { continue };
        let start = name.start() - 1;
        let end = name.end();

        if let Some(next) = content[end..].chars().next() {
            if next.is_alphanumeric() || next == '_' || next == '/' {
                continue;
            }
        }

        if is_in_code(start, &code_ranges)
            || is_in_wikilink(content, start)
            || is_in_url(content, start)
            || is_in_link_destination(content, start)
        {
            continue;
        }

        let line_start = line_start_of(content, start);
        tags.push(Tag {
            name: name.as_str().trim_end_matches('/').to_string(),
            origin: TagOrigin::Inline,
            line: Some(line_of(content, start)),
            span: Some((start - line_start, end - line_start)),
        });
    }

    tags
}

/// Tags declared in the header `tags` field, as a list or a comma/space separated string.
pub fn header_tags(header: &Mapping) -> Vec<Tag> {
    let Some(value) = header.get("tags") else {
        return Vec::new();
    };

    let names: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };

    names
        .into_iter()
        .map(|n| n.trim().trim_start_matches('#').to_string())
        .filter(|n| !n.is_empty())
        .map(|name| Tag {
            name,
            origin: TagOrigin::Header,
            line: None,
            span: None,
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Deduplicate by exact name, keeping the first occurrence.
pub fn dedupe_tags(tags: Vec<Tag>) -> Vec<Tag> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.name.clone()))
        .collect()
}

/// Whether `name` (without `#`) is something the inline parser would recognize.
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '/')
}

fn is_in_wikilink(content: &str, pos: usize) -> bool {
    let line_start = line_start_of(content, pos);
    let before = &content[line_start..pos];
    let line_end = content[pos..].find('\n').map(|i| pos + i).unwrap_or(content.len());
    let after = &content[pos..line_end];

    match (before.rfind("[["), before.rfind("]]")) {
        (Some(open), Some(close)) if open > close => after.contains("]]"),
        (Some(_), None) => after.contains("]]"),
        _ => false,
    }
}

fn is_in_url(content: &str, pos: usize) -> bool {
    let word_start = content[..pos]
        .rfind(|c: char| c.is_whitespace() || c == '(' || c == '<')
        .map(|i| i + 1)
        .unwrap_or(0);
    let word = &content[word_start..pos];
    word.contains("://") || word.starts_with("www.")
}

fn is_in_link_destination(content: &str, pos: usize) -> bool {
    let line_start = line_start_of(content, pos);
    let before = &content[line_start..pos];
    match before.rfind("](") {
        Some(open) => !before[open..].contains(')'),
        None => false,
    }
}
