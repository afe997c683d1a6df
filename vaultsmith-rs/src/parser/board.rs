//! Kanban board structure: `## Column` headings holding `- [ ] card` items.

use crate::config::{BoardConfig, CardCompletion};
use crate::graph::ratio;
use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use regex::Regex;
use serde::Serialize;
use serde_yaml::Mapping;
use std::sync::LazyLock;

static COLUMN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(.+?)\s*#*\s*$").unwrap());

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+] (?:\[(.)\](?: |$))?(.*)$").unwrap());

// One trailing metadata token: @{date}, @@{time}, #tag or [[link]]
static TRAILING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(@@?\{[^}\n]*\}|#[a-zA-Z_][\w/-]*|!?\[\[[^\]\n]+\]\])\s*$").unwrap()
});

/// A parsed board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

/// A board column (lane).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    /// Line of the `## name` heading (1-indexed).
    pub heading_line: usize,
    /// Whether the lane carries a `**Complete**` marker.
    pub complete_marker: bool,
    pub cards: Vec<Card>,
    /// First line after the column (1-indexed, exclusive).
    pub end_line: usize,
}

/// A card and the lines it owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    /// Text after the checkbox, as written.
    pub text: String,
    /// `text` without its trailing metadata tokens.
    pub title: String,
    pub checked: bool,
    /// Trailing `@{date}`, `@@{time}`, `#tag` and `[[link]]` tokens, in order.
    pub metadata: Vec<String>,
    /// First line of the card (1-indexed).
    pub start_line: usize,
    /// First line after the card and its indented continuation lines (exclusive).
    pub end_line: usize,
}

impl Card {
    /// Whether `query` names this card, by full text or by title.
    pub fn matches(&self, query: &str) -> bool {
        self.text == query || self.title == query
    }
}

impl Column {
    /// Whether this lane counts as a done lane under `config`.
    pub fn is_done_lane(&self, config: &BoardConfig) -> bool {
        self.complete_marker || config.is_done_lane(&self.name)
    }

    /// Whether a card in this column counts as done under `config`.
    pub fn is_card_done(&self, card: &Card, config: &BoardConfig) -> bool {
        match config.completion {
            CardCompletion::Checkbox => card.checked,
            CardCompletion::Lane => self.is_done_lane(config),
            CardCompletion::Either => card.checked || self.is_done_lane(config),
        }
    }
}

/// Whether the header marks this note as a kanban board.
pub fn is_board(header: &Mapping) -> bool {
    header.contains_key("kanban-plugin")
}

/// Parse the board structure out of full note content.
pub fn parse_board(content: &str) -> Board {
    let code_ranges = find_code_ranges(content);
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    let mut columns: Vec<Column> = Vec::new();
    let mut open: Option<Column> = None;
    let mut idx = 0;

    while idx < total {
        let line_num = idx + 1;
        let line = lines[idx];

        if is_line_fenced(line_num, &code_ranges) {
            idx += 1;
            continue;
        }

        if let Some(cap) = COLUMN_HEADING.captures(line) {
            if let Some(mut column) = open.take() {
                column.end_line = line_num;
                columns.push(column);
            }
            open = Some(Column {
                name: cap[1].to_string(),
                heading_line: line_num,
                complete_marker: false,
                cards: Vec::new(),
                end_line: total + 1,
            });
            idx += 1;
            continue;
        }

        let Some(column) = open.as_mut() else {
            idx += 1;
            continue;
        };

        let trimmed = line.trim();
        if trimmed == "***" || trimmed.starts_with("%%") || line.starts_with("# ") {
            column.end_line = line_num;
            if let Some(column) = open.take() {
                columns.push(column);
            }
            idx += 1;
            continue;
        }

        if trimmed == "**Complete**" {
            column.complete_marker = true;
            idx += 1;
            continue;
        }

        if let Some(cap) = CARD.captures(line) {
            let text = cap.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string();
            let checked = cap
                .get(1)
                .is_some_and(|m| m.as_str().eq_ignore_ascii_case("x"));
            let (title, metadata) = split_metadata(&text);

            let mut end = idx + 1;
            while end < total
                && !lines[end].trim().is_empty()
                && lines[end].starts_with([' ', '\t'])
            {
                end += 1;
            }

            column.cards.push(Card {
                text,
                title,
                checked,
                metadata,
                start_line: line_num,
                end_line: end + 1,
            });
            idx = end;
            continue;
        }

        idx += 1;
    }

    if let Some(column) = open.take() {
        columns.push(column);
    }

    Board { columns }
}

/// Split card text into its title and trailing metadata tokens.
pub fn split_metadata(text: &str) -> (String, Vec<String>) {
    let mut rest = text.trim_end();
    let mut tokens = Vec::new();

    while let Some(cap) = TRAILING_TOKEN.captures(rest) {
        let (Some(whole), Some(token)) = (cap.get(0), cap.get(1)) else {
            break;
        };
        if whole.start() == 0 && tokens.is_empty() && whole.end() == rest.len() && rest == token.as_str() {
            // a card that is nothing but a token keeps it as its title
            break;
        }
        tokens.push(token.as_str().to_string());
        rest = rest[..whole.start()].trim_end();
    }

    tokens.reverse();
    (rest.to_string(), tokens)
}

/// Render a new card line.
pub fn format_card(text: &str, checked: bool, metadata: &[String]) -> String {
    let mut line = format!("- [{}] {}", if checked { 'x' } else { ' ' }, text.trim());
    for token in metadata {
        line.push(' ');
        line.push_str(token);
    }
    line
}

/// Per-column card statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

/// Whole-board card statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardStats {
    pub columns: Vec<ColumnStats>,
    pub total_cards: usize,
    pub completed_cards: usize,
    pub completion_percentage: f64,
}

impl Board {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Card counts and completion rates under the configured completion policy.
    pub fn statistics(&self, config: &BoardConfig) -> BoardStats {
        let columns: Vec<ColumnStats> = self
            .columns
            .iter()
            .map(|column| {
                let total = column.cards.len();
                let completed = column
                    .cards
                    .iter()
                    .filter(|card| column.is_card_done(card, config))
                    .count();
                ColumnStats {
                    name: column.name.clone(),
                    total,
                    completed,
                    completion_rate: ratio(completed, total),
                }
            })
            .collect();

        let total_cards = columns.iter().map(|c| c.total).sum();
        let completed_cards = columns.iter().map(|c| c.completed).sum();
        BoardStats {
            columns,
            total_cards,
            completed_cards,
            completion_percentage: ratio(completed_cards, total_cards) * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOARD: &str = "---\nkanban-plugin: basic\n---\n\n## Todo\n\n- [ ] Write docs @{2025-01-10} #writing\n\t- [ ] outline\n- [ ] Fix bug\n\n## Doing\n\n- [ ] Review [[PR 12]]\n\n## Done\n\n**Complete**\n- [x] Release\n\n%% kanban:settings\n```\n{\"kanban-plugin\":\"basic\"}\n```\n%%\n";

    #[test]
    fn test_columns_and_cards() {
        let board = parse_board(BOARD);
        let names: Vec<_> = board.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Todo", "Doing", "Done"]);
        assert_eq!(board.card_count(), 4);
        assert_eq!(board.columns[0].heading_line, 5);
        assert_eq!(board.columns[0].end_line, 11);
        assert!(board.columns[2].complete_marker);
    }

    #[test]
    fn test_card_owns_continuation_lines() {
        let board = parse_board(BOARD);
        let card = &board.columns[0].cards[0];
        assert_eq!(card.start_line, 7);
        assert_eq!(card.end_line, 9);
        assert_eq!(card.title, "Write docs");
        assert_eq!(card.metadata, vec!["@{2025-01-10}", "#writing"]);
    }

    #[test]
    fn test_settings_block_ends_column() {
        let board = parse_board(BOARD);
        let done = &board.columns[2];
        assert_eq!(done.cards.len(), 1);
        assert!(done.cards[0].checked);
        assert_eq!(done.end_line, 20);
    }

    #[test]
    fn test_split_metadata() {
        let (title, meta) = split_metadata("Call [[Alice Smith]] @{2025-02-01} @@{10:30}");
        assert_eq!(title, "Call");
        assert_eq!(meta, vec!["[[Alice Smith]]", "@{2025-02-01}", "@@{10:30}"]);

        let (title, meta) = split_metadata("#solo");
        assert_eq!(title, "#solo");
        assert!(meta.is_empty());
    }

    #[test]
    fn test_duplicate_cards_allowed() {
        let board = parse_board("## A\n- [ ] same\n- [ ] same\n");
        assert_eq!(board.columns[0].cards.len(), 2);
    }

    #[test]
    fn test_statistics_policies() {
        let board = parse_board(BOARD);

        let checkbox = board.statistics(&BoardConfig::default());
        assert_eq!(checkbox.total_cards, 4);
        assert_eq!(checkbox.completed_cards, 1);
        assert_eq!(checkbox.completion_percentage, 25.0);

        let lane = BoardConfig {
            completion: CardCompletion::Lane,
            ..BoardConfig::default()
        };
        let stats = board.statistics(&lane);
        assert_eq!(stats.columns[2].completed, 1);
        assert_eq!(stats.columns[0].completed, 0);
    }

    #[test]
    fn test_format_card() {
        assert_eq!(
            format_card("New task", false, &["@{2025-03-01}".to_string()]),
            "- [ ] New task @{2025-03-01}"
        );
    }
}
