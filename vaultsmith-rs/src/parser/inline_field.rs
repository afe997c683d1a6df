//! Inline field parsing: `key:: value`, `[key:: value]` and `(key:: value)`.

use crate::parser::code_block::{find_code_ranges, is_in_code, is_line_fenced, line_of, line_start_of};
use crate::types::{FieldSyntax, FieldValueType, InlineField};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

// [key:: value], where the value may hold [[wikilinks]]
static BRACKET_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([\w][\w \-]*?)::([^\[\]\n]*(?:\[\[[^\]\n]*\]\][^\[\]\n]*)*)\]").unwrap()
});

static PAREN_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\w][\w \-]*?)::([^()\n]*)\)").unwrap());

// key:: value filling the line, optionally behind a list marker or in bold/italic.
// The `::` must be followed by whitespace or end the line, so `std::io` is prose.
static FULL_LINE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*(?:[-*+]\s+|\d+\.\s+)?)([*_]{0,2}[\w][\w \-]*?[*_]{0,2})::(\s.*|)$").unwrap()
});

/// Parse all inline fields, ordered left-to-right, top-to-bottom.
pub fn parse_inline_fields(content: &str) -> Vec<InlineField> {
    let code_ranges = find_code_ranges(content);
    let mut fields = Vec::new();

    for (regex, syntax) in [
        (&*BRACKET_FIELD, FieldSyntax::Bracket),
        (&*PAREN_FIELD, FieldSyntax::Paren),
    ] {
        for cap in regex.captures_iter(content) {
            let Some(whole) = cap.get(0) else { continue };
            if is_in_code(whole.start(), &code_ranges) {
                continue;
            }
            let line_start = line_start_of(content, whole.start());
            fields.push(make_field(
                &cap[1],
                &cap[2],
                syntax,
                line_of(content, whole.start()),
                whole.start() - line_start,
                whole.end() - line_start,
            ));
        }
    }

    let enclosed_lines: Vec<usize> = fields.iter().map(|f| f.line).collect();
    let mut offset = 0;
    for (idx, raw_line) in content.split_inclusive('\n').enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim_end_matches(['\n', '\r']);
        let line_offset = offset;
        offset += raw_line.len();

        if enclosed_lines.contains(&line_num)
            || is_line_fenced(line_num, &code_ranges)
            || is_in_code(line_offset, &code_ranges)
        {
            continue;
        }
        let Some(cap) = FULL_LINE_FIELD.captures(line) else {
            continue;
        };
        let start_col = cap.get(1).map(|m| m.end()).unwrap_or(0);
        fields.push(make_field(
            &cap[2],
            &cap[3],
            FieldSyntax::FullLine,
            line_num,
            start_col,
            line.trim_end().len(),
        ));
    }

    fields.sort_by_key(|f| (f.line, f.start_col));
    fields
}

fn make_field(
    key: &str,
    value: &str,
    syntax: FieldSyntax,
    line: usize,
    start_col: usize,
    end_col: usize,
) -> InlineField {
    let key = key.trim().trim_matches(|c| c == '*' || c == '_').trim().to_string();
    let value = value.trim().to_string();
    InlineField {
        canonical_key: canonical_key(&key),
        value_type: detect_value_type(&value),
        key,
        value,
        syntax,
        line,
        start_col,
        end_col,
    }
}

/// Normalize a key for matching: lowercase, emphasis stripped, whitespace runs to `-`.
pub fn canonical_key(key: &str) -> String {
    key.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Detect the type of a field value.
pub fn detect_value_type(value: &str) -> FieldValueType {
    let v = value.trim();
    if v.is_empty() {
        return FieldValueType::Text;
    }
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false") {
        return FieldValueType::Boolean;
    }
    if v.parse::<f64>().is_ok() {
        return FieldValueType::Number;
    }
    let date_part = v.split_once('T').map(|(d, _)| d).unwrap_or(v);
    if NaiveDate::parse_from_str(date_part, "%Y-%m-%d").is_ok() {
        return FieldValueType::Date;
    }
    if v.starts_with("[[") && v.ends_with("]]") && v.matches("[[").count() == 1 {
        return FieldValueType::Link;
    }
    if v.contains(',') {
        return FieldValueType::List;
    }
    FieldValueType::Text
}

/// Render a field in the given syntax.
pub fn format_field(key: &str, value: &str, syntax: FieldSyntax) -> String {
    match syntax {
        FieldSyntax::FullLine => format!("{}:: {}", key, value),
        FieldSyntax::Bracket => format!("[{}:: {}]", key, value),
        FieldSyntax::Paren => format!("({}:: {})", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_three_syntaxes() {
        let content = "status:: active\nText [rating:: 5] and (due:: 2024-03-01) here.";
        let fields = parse_inline_fields(content);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].syntax, FieldSyntax::FullLine);
        assert_eq!(fields[0].value, "active");
        assert_eq!(fields[1].syntax, FieldSyntax::Bracket);
        assert_eq!(fields[1].value_type, FieldValueType::Number);
        assert_eq!(fields[2].syntax, FieldSyntax::Paren);
        assert_eq!(fields[2].value_type, FieldValueType::Date);
    }

    #[test]
    fn test_multiple_per_line_in_order() {
        let fields = parse_inline_fields("[a:: 1] [b:: 2] (c:: 3)");
        let keys: Vec<_> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(fields[0].start_col, 0);
        assert_eq!(fields[0].end_col, 7);
    }

    #[test]
    fn test_wikilink_value() {
        let fields = parse_inline_fields("[project:: [[Big Plan]]]");
        assert_eq!(fields[0].value, "[[Big Plan]]");
        assert_eq!(fields[0].value_type, FieldValueType::Link);
    }

    #[test]
    fn test_list_item_and_bold_full_line() {
        let fields = parse_inline_fields("- **Due Date**:: 2024-01-01");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "Due Date");
        assert_eq!(fields[0].canonical_key, "due-date");
        assert_eq!(fields[0].start_col, 2);
    }

    #[test]
    fn test_path_separators_are_not_fields() {
        assert!(parse_inline_fields("std::io is here").is_empty());
        assert!(parse_inline_fields("- Use std::fs::write").is_empty());
        assert!(parse_inline_fields("a::b:: c").is_empty());

        let fields = parse_inline_fields("key:: value\nempty::");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, "value");
        assert_eq!(fields[1].key, "empty");
        assert_eq!(fields[1].value, "");
    }

    #[test]
    fn test_duplicate_keys_all_extracted() {
        let fields = parse_inline_fields("tag:: one\ntag:: two");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].value, "two");
    }

    #[test]
    fn test_code_skipped() {
        let fields = parse_inline_fields("```\nkey:: value\n```\n`[a:: b]`");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_value_types() {
        assert_eq!(detect_value_type("true"), FieldValueType::Boolean);
        assert_eq!(detect_value_type("3.5"), FieldValueType::Number);
        assert_eq!(detect_value_type("a, b"), FieldValueType::List);
        assert_eq!(detect_value_type("hello"), FieldValueType::Text);
        assert_eq!(detect_value_type("2024-05-01T10:00"), FieldValueType::Date);
    }

    #[test]
    fn test_format_field() {
        assert_eq!(format_field("k", "v", FieldSyntax::FullLine), "k:: v");
        assert_eq!(format_field("k", "v", FieldSyntax::Bracket), "[k:: v]");
        assert_eq!(format_field("k", "v", FieldSyntax::Paren), "(k:: v)");
    }
}
