//! Block reference parsing (`^block-id` at the end of a line).

use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use crate::types::{BlockId, BlockType};
use regex::Regex;
use std::sync::LazyLock;

// Either trailing after content or alone on its own line
static BLOCK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\^([a-zA-Z0-9_-]+)\s*$").unwrap());

/// Parse all block ids from content, skipping fenced code.
pub fn parse_block_ids(content: &str) -> Vec<BlockId> {
    let code_ranges = find_code_ranges(content);
    let lines: Vec<&str> = content.lines().collect();
    let mut block_ids = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        if is_line_fenced(line_num, &code_ranges) {
            continue;
        }
        if let Some(cap) = BLOCK_ID.captures(line) {
            // An id on its own line labels the block just above it
            let subject = if line.trim_start().starts_with('^') && idx > 0 {
                lines[idx - 1]
            } else {
                line
            };
            block_ids.push(BlockId {
                id: cap[1].to_string(),
                line: line_num,
                block_type: block_type_of(subject),
            });
        }
    }

    block_ids
}

fn block_type_of(line: &str) -> BlockType {
    let trimmed = line.trim_start();

    if trimmed.starts_with('#') {
        BlockType::Heading
    } else if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("+ ") {
        BlockType::ListItem
    } else if trimmed.starts_with(|c: char| c.is_ascii_digit())
        && trimmed
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .starts_with(". ")
    {
        BlockType::ListItem
    } else if trimmed.starts_with('>') {
        BlockType::Blockquote
    } else if trimmed.starts_with('|') && trimmed.trim_end().ends_with('|') {
        BlockType::Table
    } else {
        BlockType::Paragraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_block_id() {
        let ids = parse_block_ids("Some paragraph text ^abc123\n\n- item ^item-1");
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].id, "abc123");
        assert_eq!(ids[0].block_type, BlockType::Paragraph);
        assert_eq!(ids[1].line, 3);
        assert_eq!(ids[1].block_type, BlockType::ListItem);
    }

    #[test]
    fn test_own_line_block_id() {
        let ids = parse_block_ids("| a | b |\n| - | - |\n^table1");
        assert_eq!(ids[0].id, "table1");
        assert_eq!(ids[0].block_type, BlockType::Table);
        assert_eq!(ids[0].line, 3);
    }

    #[test]
    fn test_not_a_block_id() {
        assert!(parse_block_ids("x^2 is math").is_empty());
        assert!(parse_block_ids("```\ncode ^id\n```").is_empty());
    }

    #[test]
    fn test_block_types() {
        assert_eq!(block_type_of("## Heading"), BlockType::Heading);
        assert_eq!(block_type_of("1. item"), BlockType::ListItem);
        assert_eq!(block_type_of("> quote"), BlockType::Blockquote);
    }
}
