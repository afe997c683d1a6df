//! Inline field edits.

use super::{insert_before_line, line_spans, line_text, remove_lines, replace_line};
use crate::error::{Result, VaultError};
use crate::note::Note;
use crate::parser::inline_field::{canonical_key, format_field};
use crate::types::{FieldSyntax, InlineField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Where a new field is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldPosition {
    /// First line of the body.
    Start,
    /// Last line of the note.
    #[default]
    End,
    /// Directly below the first heading with this text.
    AfterHeading(String),
}

fn check_key(key: &str) -> Result<()> {
    let valid = !canonical_key(key).is_empty()
        && key.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
        && !key.contains("::")
        && !key.contains(['[', ']', '(', ')', '\n']);
    if valid {
        Ok(())
    } else {
        Err(VaultError::InvalidLine {
            line: 0,
            message: format!("invalid field key '{}'", key),
        })
    }
}

fn one_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Add a field on its own line. Returns the content and the new line number.
///
/// Bracket and paren fields are written alone on the line as well.
pub fn add_field(
    content: &str,
    path: &Path,
    key: &str,
    value: &str,
    syntax: FieldSyntax,
    position: &FieldPosition,
) -> Result<(String, usize)> {
    check_key(key)?;
    let note = Note::parse(path, content);
    let total = line_spans(content).len();

    let at = match position {
        FieldPosition::Start => note.body_start_line().min(total + 1),
        FieldPosition::End => total + 1,
        FieldPosition::AfterHeading(text) => {
            let heading = note
                .heading_anchor(text)
                .ok_or_else(|| VaultError::HeadingNotFound {
                    note: path.to_path_buf(),
                    heading: text.clone(),
                })?;
            heading.line + 1
        }
    };

    let line = format_field(key.trim(), &one_line(value), syntax);
    Ok((insert_before_line(content, at, &line), at))
}

fn fields_for(note: &Note, key: &str) -> Vec<InlineField> {
    let wanted = canonical_key(key);
    note.inline_fields()
        .into_iter()
        .filter(|f| f.canonical_key == wanted)
        .collect()
}

/// Replace the value of a field, keeping its key text and syntax.
///
/// `occurrence` picks among several fields with the same key (0-based,
/// document order); the first is used by default.
pub fn set_field_value(
    content: &str,
    path: &Path,
    key: &str,
    value: &str,
    occurrence: Option<usize>,
) -> Result<(String, usize)> {
    let note = Note::parse(path, content);
    let field = fields_for(&note, key)
        .into_iter()
        .nth(occurrence.unwrap_or(0))
        .ok_or_else(|| VaultError::FieldNotFound {
            note: path.to_path_buf(),
            key: key.to_string(),
        })?;

    let Some(text) = line_text(content, field.line) else {
        return Err(VaultError::FieldNotFound {
            note: path.to_path_buf(),
            key: key.to_string(),
        });
    };

    let span = &text[field.start_col..field.end_col];
    let sep = span.find("::").unwrap_or(0) + 2;
    let closing = match field.syntax {
        FieldSyntax::FullLine => "",
        FieldSyntax::Bracket => "]",
        FieldSyntax::Paren => ")",
    };
    let rewritten = format!(
        "{}{}{} {}{}{}",
        &text[..field.start_col],
        &span[..sep - 2],
        "::",
        one_line(value),
        closing,
        &text[field.end_col..]
    );

    Ok((replace_line(content, field.line, &rewritten), field.line))
}

/// Remove every field with this key, or only those on `line`. Returns the
/// content and the number of fields removed; zero removals is `FieldNotFound`.
pub fn remove_field(
    content: &str,
    path: &Path,
    key: &str,
    line: Option<usize>,
) -> Result<(String, usize)> {
    let note = Note::parse(path, content);
    let targets: Vec<InlineField> = fields_for(&note, key)
        .into_iter()
        .filter(|f| line.is_none_or(|l| f.line == l))
        .collect();

    if targets.is_empty() {
        return Err(VaultError::FieldNotFound {
            note: path.to_path_buf(),
            key: key.to_string(),
        });
    }
    let removed = targets.len();

    let mut by_line: BTreeMap<usize, Vec<InlineField>> = BTreeMap::new();
    for field in targets {
        by_line.entry(field.line).or_default().push(field);
    }

    let mut out = content.to_string();
    for (line, mut fields) in by_line.into_iter().rev() {
        if fields.iter().any(|f| f.syntax == FieldSyntax::FullLine) {
            out = remove_lines(&out, line, line + 1);
            continue;
        }
        let Some(text) = line_text(&out, line) else { continue };
        let mut text = text.to_string();
        fields.sort_by(|a, b| b.start_col.cmp(&a.start_col));
        for field in fields {
            let mut start = field.start_col;
            if start > 0 && text.as_bytes()[start - 1] == b' ' {
                start -= 1;
            }
            text.replace_range(start..field.end_col, "");
        }
        out = if text.trim().is_empty() {
            remove_lines(&out, line, line + 1)
        } else {
            replace_line(&out, line, &text)
        };
    }

    Ok((out, removed))
}
