//! Code span detection, so dialect parsers can skip code.

use regex::Regex;
use std::sync::LazyLock;

/// A byte range of `content` that is code (fenced block or inline span).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRange {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// First line of the range (1-indexed).
    pub start_line: usize,
    /// Last line of the range (1-indexed).
    pub end_line: usize,
    pub fenced: bool,
}

// ``code`` (may contain single backticks) or `code`
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``(?:[^`\n]|`[^`\n])+``|`[^`\n]+`").unwrap());

/// Find all fenced blocks and inline code spans, sorted by start offset.
///
/// An unclosed fence runs to the end of the content.
pub fn find_code_ranges(content: &str) -> Vec<CodeRange> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, usize, char, usize)> = None; // (start, line, char, len)
    let mut offset = 0;

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let line_num = idx + 1;
        let trimmed = line.trim_start();
        let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let fence_len = fence_char
            .map(|c| trimmed.chars().take_while(|x| *x == c).count())
            .unwrap_or(0);

        match open {
            None if fence_len >= 3 => {
                open = Some((offset, line_num, fence_char.unwrap_or('`'), fence_len));
            }
            Some((start, start_line, c, len))
                if fence_char == Some(c)
                    && fence_len >= len
                    && trimmed.trim_end().chars().all(|x| x == c) =>
            {
                ranges.push(CodeRange {
                    start,
                    end: offset + line.trim_end_matches(['\n', '\r']).len(),
                    start_line,
                    end_line: line_num,
                    fenced: true,
                });
                open = None;
            }
            _ => {}
        }
        offset += line.len();
    }

    if let Some((start, start_line, _, _)) = open {
        ranges.push(CodeRange {
            start,
            end: content.len(),
            start_line,
            end_line: content.split_inclusive('\n').count().max(1),
            fenced: true,
        });
    }

    let fenced_count = ranges.len();
    for m in INLINE_CODE.find_iter(content) {
        if ranges[..fenced_count]
            .iter()
            .any(|r| m.start() < r.end && m.end() > r.start)
        {
            continue;
        }
        let line = line_of(content, m.start());
        ranges.push(CodeRange {
            start: m.start(),
            end: m.end(),
            start_line: line,
            end_line: line,
            fenced: false,
        });
    }

    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Check if a byte offset is inside any code range.
pub fn is_in_code(offset: usize, ranges: &[CodeRange]) -> bool {
    ranges.iter().any(|r| offset >= r.start && offset < r.end)
}

/// Check if a line is inside a fenced block (fence lines included).
pub fn is_line_fenced(line: usize, ranges: &[CodeRange]) -> bool {
    ranges
        .iter()
        .any(|r| r.fenced && line >= r.start_line && line <= r.end_line)
}

/// 1-indexed line of a byte offset.
pub(crate) fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Byte offset where the line containing `offset` starts.
pub(crate) fn line_start_of(content: &str, offset: usize) -> usize {
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block() {
        let content = "Some text\n\n```rust\nlet x = [[not a link]];\n```\n\nMore text";
        let ranges = find_code_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].fenced);
        assert_eq!(ranges[0].start_line, 3);
        assert_eq!(ranges[0].end_line, 5);
    }

    #[test]
    fn test_inline_code() {
        let ranges = find_code_ranges("Some `inline [[code]]` here");
        assert_eq!(ranges.len(), 1);
        assert!(!ranges[0].fenced);
    }

    #[test]
    fn test_double_backtick_inline() {
        let ranges = find_code_ranges("Some ``inline `code` with backticks`` here");
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_tilde_and_backtick_fences() {
        let content = "```\nouter\n```\n\ntext\n\n~~~\ninner\n~~~";
        let ranges = find_code_ranges(content);
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.fenced));
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let content = "a\n```\ncode #tag\nmore";
        let ranges = find_code_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end, content.len());
        assert!(is_line_fenced(4, &ranges));
    }

    #[test]
    fn test_inline_inside_fence_not_duplicated() {
        let content = "```\n`x`\n```";
        assert_eq!(find_code_ranges(content).len(), 1);
    }

    #[test]
    fn test_is_in_code() {
        let content = "before `code` after";
        let ranges = find_code_ranges(content);
        assert!(!is_in_code(0, &ranges));
        assert!(is_in_code(8, &ranges));
        assert!(!is_in_code(14, &ranges));
    }
}
