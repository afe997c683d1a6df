//! Inserting content relative to headings and blocks, and appending.

use super::{eol, insert_before_line, line_spans, line_text};
use crate::error::{Result, VaultError};
use crate::note::Note;
use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use crate::parser::heading::section_end_line;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when an anchor text matches more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Use the first match in document order.
    #[default]
    First,
    /// Fail with `Ambiguous` unless exactly one match exists.
    Unique,
}

fn pick<T>(mut matches: Vec<T>, policy: MatchPolicy, what: &'static str, query: &str) -> Option<Result<T>> {
    match matches.len() {
        0 => None,
        n if n > 1 && policy == MatchPolicy::Unique => Some(Err(VaultError::Ambiguous {
            what,
            query: query.to_string(),
            count: n,
        })),
        _ => Some(Ok(matches.remove(0))),
    }
}

/// Insert `text` into the section under `heading`. Returns the content and
/// the line the insertion starts on.
pub fn insert_after_heading(
    content: &str,
    path: &Path,
    heading: &str,
    text: &str,
    policy: MatchPolicy,
) -> Result<(String, usize)> {
    let note = Note::parse(path, content);
    let headings = note.headings();
    let indices: Vec<usize> = headings
        .iter()
        .enumerate()
        .filter(|(_, h)| h.text == heading)
        .map(|(i, _)| i)
        .collect();

    let idx = pick(indices, policy, "heading", heading).ok_or_else(|| {
        VaultError::HeadingNotFound {
            note: path.to_path_buf(),
            heading: heading.to_string(),
        }
    })??;

    let total = line_spans(content).len();
    let end = section_end_line(&headings, idx, total);
    Ok(insert_in_section(content, headings[idx].line, end, text))
}

/// Insert `text` after the block carrying `^block_id`.
///
/// The block's section ends at the next heading of any level.
pub fn insert_after_block(
    content: &str,
    path: &Path,
    block_id: &str,
    text: &str,
    policy: MatchPolicy,
) -> Result<(String, usize)> {
    let note = Note::parse(path, content);
    let id = block_id.trim_start_matches('^');
    let block = pick(note.blocks_named(id), policy, "block", id).ok_or_else(|| {
        VaultError::BlockNotFound {
            note: path.to_path_buf(),
            id: id.to_string(),
        }
    })??;

    let total = line_spans(content).len();
    let end = note
        .headings()
        .iter()
        .find(|h| h.line > block.line)
        .map(|h| h.line - 1)
        .unwrap_or(total);
    Ok(insert_in_section(content, block.line, end, text))
}

// New content goes before the first blank line following the anchor, or at
// the end of the section when it has none.
fn insert_in_section(content: &str, anchor: usize, section_end: usize, text: &str) -> (String, usize) {
    let fences = find_code_ranges(content);
    let at = (anchor + 1..=section_end)
        .find(|&line| {
            !is_line_fenced(line, &fences)
                && line_text(content, line).is_some_and(|l| l.trim().is_empty())
        })
        .unwrap_or(section_end + 1);

    let block = text.trim_end_matches(['\n', '\r']);
    (insert_before_line(content, at, block), at)
}

/// Append `text` with exactly one newline before and after it.
pub fn append(content: &str, text: &str) -> String {
    let nl = eol(content);
    let existing = content.trim_end_matches(['\n', '\r']);
    let text = text.trim_matches(['\n', '\r']).replace("\r\n", "\n").replace('\n', nl);
    if existing.is_empty() {
        format!("{}{}", text, nl)
    } else {
        format!("{}{}{}{}", existing, nl, text, nl)
    }
}
