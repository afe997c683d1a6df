//! Kanban card edits.

use super::{insert_before_line, line_text, lines_text, remove_lines, replace_line};
use crate::error::{Result, VaultError};
use crate::parser::board::{Board, Column, format_card, parse_board};
use crate::parser::task::set_task_symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a card lands within its column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Start,
    #[default]
    End,
    /// Before the card currently at this index (0-based); past the end appends.
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCard {
    pub text: String,
    pub checked: bool,
    /// Written as an `@{YYYY-MM-DD}` token.
    pub due: Option<NaiveDate>,
    pub tags: Vec<String>,
}

fn column<'b>(board: &'b Board, path: &Path, name: &str) -> Result<&'b Column> {
    board.column(name).ok_or_else(|| VaultError::ColumnNotFound {
        note: path.to_path_buf(),
        column: name.to_string(),
    })
}

/// Index of the single card in `column` matching `query`.
fn find_card(column: &Column, query: &str) -> Result<usize> {
    let matches: Vec<usize> = column
        .cards
        .iter()
        .enumerate()
        .filter(|(_, c)| c.matches(query))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(VaultError::CardNotFound {
            column: column.name.clone(),
            card: query.to_string(),
        }),
        [idx] => Ok(*idx),
        _ => Err(VaultError::Ambiguous {
            what: "card",
            query: query.to_string(),
            count: matches.len(),
        }),
    }
}

// Line before which a card at `position` is inserted.
fn insertion_line(content: &str, column: &Column, position: Position) -> usize {
    let index = match position {
        Position::Start => 0,
        Position::End => column.cards.len(),
        Position::Index(i) => i.min(column.cards.len()),
    };
    if let Some(card) = column.cards.get(index) {
        return card.start_line;
    }
    if let Some(last) = column.cards.last() {
        return last.end_line;
    }

    // empty column: below the heading, a following blank line and any
    // completion marker
    let mut at = column.heading_line + 1;
    if line_text(content, at).is_some_and(|l| l.trim().is_empty()) {
        at += 1;
    }
    let marker = (column.heading_line + 1..column.end_line)
        .find(|&l| line_text(content, l).is_some_and(|t| t.trim() == "**Complete**"));
    if let Some(marker) = marker {
        at = at.max(marker + 1);
    }
    at.min(column.end_line)
}

/// Add a card to a column. Returns the content and the card's line.
pub fn add_card(
    content: &str,
    path: &Path,
    column_name: &str,
    card: &NewCard,
    position: Position,
) -> Result<(String, usize)> {
    let board = parse_board(content);
    let column = column(&board, path, column_name)?;

    let mut metadata = Vec::new();
    if let Some(due) = card.due {
        metadata.push(format!("@{{{}}}", due.format("%Y-%m-%d")));
    }
    metadata.extend(
        card.tags
            .iter()
            .map(|t| format!("#{}", t.trim().trim_start_matches('#'))),
    );
    let text = card.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let line = format_card(&text, card.checked, &metadata);

    let at = insertion_line(content, column, position);
    Ok((insert_before_line(content, at, &line), at))
}

/// Move a card, with its continuation lines, to another column (or another
/// position in the same one). Returns the content and the card's new line.
pub fn move_card(
    content: &str,
    path: &Path,
    from: &str,
    query: &str,
    to: &str,
    position: Position,
) -> Result<(String, usize)> {
    let board = parse_board(content);
    let source = column(&board, path, from)?;
    column(&board, path, to)?;
    let card = &source.cards[find_card(source, query)?];

    let block = lines_text(content, card.start_line, card.end_line);
    let without = remove_lines(content, card.start_line, card.end_line);

    let board = parse_board(&without);
    let dest = column(&board, path, to)?;
    let at = insertion_line(&without, dest, position);
    Ok((insert_before_line(&without, at, &block), at))
}

/// Flip a card's checkbox. Returns the content and the new checked state.
///
/// A card written without a checkbox gains a checked one.
pub fn toggle_card(content: &str, path: &Path, column_name: &str, query: &str) -> Result<(String, bool)> {
    let board = parse_board(content);
    let column = column(&board, path, column_name)?;
    let card = &column.cards[find_card(column, query)?];
    let line = line_text(content, card.start_line).unwrap_or_default();

    let checked = !card.checked;
    let symbol = if checked { 'x' } else { ' ' };
    let new_line = match set_task_symbol(line, symbol) {
        Some(l) => l,
        None => {
            let marker_end = (line.len() - line.trim_start().len() + 2).min(line.len());
            let (marker, text) = line.split_at(marker_end);
            format!("{}[{}] {}", marker, symbol, text)
        }
    };

    Ok((replace_line(content, card.start_line, &new_line), checked))
}
