//! Heading parsing and slug generation.

use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use crate::types::Heading;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// ATX-style heading, with an optional trailing block id
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+\^[a-zA-Z0-9_-]+)?\s*$").unwrap());

/// Parse all headings from content, skipping fenced code.
pub fn parse_headings(content: &str) -> Vec<Heading> {
    let code_ranges = find_code_ranges(content);
    let mut headings = Vec::new();
    let mut slug_counts: HashMap<String, usize> = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        if is_line_fenced(line_num, &code_ranges) {
            continue;
        }

        let Some(cap) = HEADING.captures(line) else {
            continue;
        };
        let level = cap[1].len() as u8;
        let text = cap[2].trim().trim_end_matches('#').trim_end().to_string();
        let slug = unique_slug(&slugify(&text), &mut slug_counts);

        headings.push(Heading {
            text,
            level,
            line: line_num,
            slug,
        });
    }

    headings
}

/// Generate a URL-safe slug from heading text.
///
/// Text is NFC-normalized and lowercased; whitespace runs become one hyphen
/// and punctuation other than `-`/`_` is dropped.
pub fn slugify(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let mut slug = String::new();
    let mut last_was_hyphen = false;

    for c in normalized.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if (c == '-' || c == '_' || c.is_whitespace()) && !last_was_hyphen && !slug.is_empty()
        {
            slug.push(if c == '_' { '_' } else { '-' });
            last_was_hyphen = c != '_';
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn unique_slug(base: &str, counts: &mut HashMap<String, usize>) -> String {
    let count = counts.entry(base.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

/// Last line (inclusive) of the section opened by `headings[idx]`.
///
/// A section runs until the next heading of the same or higher level.
pub fn section_end_line(headings: &[Heading], idx: usize, total_lines: usize) -> usize {
    let level = headings[idx].level;
    headings[idx + 1..]
        .iter()
        .find(|h| h.level <= level)
        .map(|h| h.line - 1)
        .unwrap_or(total_lines)
}
