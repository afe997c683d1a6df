//! Adding and removing tags.

use super::{insert_before_line, line_spans, line_text, remove_lines, replace_line};
use crate::config::TagConfig;
use crate::error::{Result, VaultError};
use crate::note::Note;
use crate::parser::frontmatter::{replace_frontmatter, set_yaml_key};
use crate::parser::tag::{header_tags, is_valid_tag_name};
use crate::types::TagOrigin;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

fn tag_name(tag: &str) -> Result<String> {
    let name = tag.trim().trim_start_matches('#');
    if is_valid_tag_name(name) {
        Ok(name.to_string())
    } else {
        Err(VaultError::InvalidTag(tag.to_string()))
    }
}

/// Add a tag. A note already carrying it (under the matching policy) is
/// left as is.
///
/// Notes with a header `tags` field get the tag appended there; otherwise
/// an inline `#tag` line is added at the end of the body.
pub fn add_tag(content: &str, path: &Path, tag: &str, policy: &TagConfig) -> Result<String> {
    let name = tag_name(tag)?;
    let note = Note::parse(path, content);
    let header = note.header()?;

    if note.tag_set().iter().any(|t| policy.matches(&t.name, &name)) {
        return Ok(content.to_string());
    }

    if let (Some(header), Some(yaml)) = (header, note.header_raw()) {
        if header.contains_key("tags") {
            let mut names: Vec<Value> = header_tags(&header)
                .into_iter()
                .map(|t| Value::String(t.name))
                .collect();
            names.push(Value::String(name));
            let new_yaml = set_yaml_key(yaml, "tags", &Value::Sequence(names))?;
            return Ok(replace_frontmatter(content, &new_yaml));
        }
    }

    let end = line_spans(content).len() + 1;
    Ok(insert_before_line(content, end, &format!("#{}", name)))
}

/// Remove a tag from the header list and every inline occurrence.
///
/// Removing a tag the note does not carry is a no-op.
pub fn remove_tag(content: &str, path: &Path, tag: &str, policy: &TagConfig) -> Result<String> {
    let name = tag_name(tag)?;
    let note = Note::parse(path, content);
    let mut out = content.to_string();

    if let (Some(header), Some(yaml)) = (note.header()?, note.header_raw()) {
        let tags = header_tags(&header);
        if tags.iter().any(|t| policy.matches(&t.name, &name)) {
            let remaining: Vec<Value> = tags
                .into_iter()
                .filter(|t| !policy.matches(&t.name, &name))
                .map(|t| Value::String(t.name))
                .collect();
            let new_yaml = set_yaml_key(yaml, "tags", &Value::Sequence(remaining))?;
            out = replace_frontmatter(content, &new_yaml);
        }
    }

    // spans per line, removed right to left so earlier columns stay valid
    let note = Note::parse(path, out.as_str());
    let mut by_line: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    for t in note.tags() {
        if t.origin != TagOrigin::Inline || !policy.matches(&t.name, &name) {
            continue;
        }
        if let (Some(line), Some(span)) = (t.line, t.span) {
            by_line.entry(line).or_default().push(span);
        }
    }

    for (line, mut spans) in by_line.into_iter().rev() {
        let Some(text) = line_text(&out, line) else { continue };
        let mut text = text.to_string();
        spans.sort_by(|a, b| b.0.cmp(&a.0));
        for (start, end) in spans {
            let (mut start, mut end) = (start, end);
            if start > 0 && text.as_bytes()[start - 1] == b' ' {
                start -= 1;
            } else if text.as_bytes().get(end) == Some(&b' ') {
                end += 1;
            }
            text.replace_range(start..end, "");
        }

        out = if text.trim().is_empty() {
            remove_lines(&out, line, line + 1)
        } else {
            replace_line(&out, line, &text)
        };
    }

    Ok(out)
}
