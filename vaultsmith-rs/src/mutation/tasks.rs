//! Task creation, completion toggling and metadata updates.

use super::{insert_before_line, line_spans, line_text, replace_line};
use crate::config::TaskGlyphs;
use crate::error::{Result, VaultError};
use crate::note::Note;
use crate::parser::task::{format_task_line, parse_task_line, set_task_symbol};
use crate::types::{Priority, Task};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A task to be written into a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub text: String,
    pub due: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub recurrence: Option<String>,
}

/// Where a new task goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPosition {
    #[default]
    End,
    /// First line of the body.
    Top,
    /// Directly below the first heading with this text.
    AfterHeading(String),
}

/// A change to one optional task attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldChange<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T: Clone> FieldChange<T> {
    fn apply(&self, current: &mut Option<T>) {
        match self {
            FieldChange::Keep => {}
            FieldChange::Clear => *current = None,
            FieldChange::Set(value) => *current = Some(value.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub priority: Option<Priority>,
    pub due: FieldChange<NaiveDate>,
    pub scheduled: FieldChange<NaiveDate>,
    pub start: FieldChange<NaiveDate>,
    pub recurrence: FieldChange<String>,
}

fn check_recurrence(rule: &str) -> Result<()> {
    if rule.trim().to_lowercase().starts_with("every") {
        Ok(())
    } else {
        Err(VaultError::InvalidRecurrence(rule.to_string()))
    }
}

fn task_at(content: &str, path: &Path, line: usize, glyphs: &TaskGlyphs) -> Result<Task> {
    Note::parse(path, content)
        .tasks(glyphs)
        .into_iter()
        .find(|t| t.location.line == line)
        .ok_or_else(|| VaultError::TaskNotFound {
            note: path.to_path_buf(),
            line,
        })
}

/// Write a new open task. Returns the content and the task's line.
pub fn create_task(
    content: &str,
    path: &Path,
    task: &NewTask,
    position: &TaskPosition,
    glyphs: &TaskGlyphs,
) -> Result<(String, usize)> {
    if let Some(ref rule) = task.recurrence {
        check_recurrence(rule)?;
    }
    let text = task.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let base = format!("- [ ] {}", text);
    let mut parsed = parse_task_line(&base, 1, path, glyphs).ok_or_else(|| VaultError::InvalidLine {
        line: 1,
        message: format!("cannot build a task from '{}'", task.text),
    })?;

    if let Some(priority) = task.priority {
        parsed.priority = priority;
    }
    parsed.due = task.due.or(parsed.due);
    parsed.scheduled = task.scheduled.or(parsed.scheduled);
    parsed.start = task.start.or(parsed.start);
    if task.recurrence.is_some() {
        parsed.recurrence = task.recurrence.clone();
    }
    let line = format_task_line(&parsed, glyphs);

    let note = Note::parse(path, content);
    let total = line_spans(content).len();
    let at = match position {
        TaskPosition::End => total + 1,
        TaskPosition::Top => note.body_start_line().min(total + 1),
        TaskPosition::AfterHeading(text) => {
            note.heading_anchor(text)
                .ok_or_else(|| VaultError::HeadingNotFound {
                    note: path.to_path_buf(),
                    heading: text.clone(),
                })?
                .line
                + 1
        }
    };

    Ok((insert_before_line(content, at, &line), at))
}

/// Flip a task between open and done. Returns the content and the new state.
///
/// Completing with a `done_date` stamps it; reopening removes any stamp.
pub fn toggle_task(
    content: &str,
    path: &Path,
    line: usize,
    done_date: Option<NaiveDate>,
    glyphs: &TaskGlyphs,
) -> Result<(String, bool)> {
    let task = task_at(content, path, line, glyphs)?;
    let text = line_text(content, line).unwrap_or_default();
    let completing = !task.completed;

    let mut new_line = set_task_symbol(text, if completing { 'x' } else { ' ' }).ok_or_else(|| {
        VaultError::TaskNotFound {
            note: path.to_path_buf(),
            line,
        }
    })?;

    if completing {
        if let (Some(date), None) = (done_date, task.done) {
            let stamp = format!("{} {}", glyphs.done, date.format("%Y-%m-%d"));
            new_line = insert_before_block_id(&new_line, &stamp);
        }
    } else if task.done.is_some() || new_line.contains(glyphs.done.as_str()) {
        new_line = clear_marker(&new_line, &glyphs.done, glyphs, false);
    }

    Ok((replace_line(content, line, &new_line), completing))
}

/// Apply metadata changes to a task.
///
/// Only the touched markers change: an existing marker is rewritten where
/// it stands, a new one goes before the block id (or at the end of the
/// line), and everything else on the line keeps its bytes.
pub fn update_task(
    content: &str,
    path: &Path,
    line: usize,
    update: &TaskUpdate,
    glyphs: &TaskGlyphs,
) -> Result<String> {
    if let FieldChange::Set(ref rule) = update.recurrence {
        check_recurrence(rule)?;
    }
    task_at(content, path, line, glyphs)?;
    let mut text = line_text(content, line).unwrap_or_default().to_string();

    if let Some(priority) = update.priority {
        text = set_priority(&text, priority, glyphs);
    }
    let dates = [
        (&update.due, &glyphs.due),
        (&update.scheduled, &glyphs.scheduled),
        (&update.start, &glyphs.start),
    ];
    for (change, glyph) in dates {
        text = match change {
            FieldChange::Keep => text,
            FieldChange::Clear => clear_marker(&text, glyph, glyphs, false),
            FieldChange::Set(date) => {
                set_marker(&text, glyph, &date.format("%Y-%m-%d").to_string(), glyphs, false)
            }
        };
    }
    text = match &update.recurrence {
        FieldChange::Keep => text,
        FieldChange::Clear => clear_marker(&text, &glyphs.recurrence, glyphs, true),
        FieldChange::Set(rule) => set_marker(&text, &glyphs.recurrence, rule.trim(), glyphs, true),
    };

    Ok(replace_line(content, line, &text))
}

const VARIATION_SELECTOR: char = '\u{FE0F}';

// Start of a trailing ` ^block-id`, if the line ends with one.
fn block_id_start(line: &str) -> Option<usize> {
    let trimmed = line.trim_end();
    let pos = trimmed.rfind(" ^")?;
    let id = &trimmed[pos + 2..];
    (!id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')).then_some(pos)
}

fn insert_before_block_id(line: &str, token: &str) -> String {
    let trimmed = line.trim_end();
    match block_id_start(trimmed) {
        Some(pos) => format!("{} {}{}", &trimmed[..pos], token, &trimmed[pos..]),
        None => format!("{} {}", trimmed, token),
    }
}

/// Location of the first `glyph` marker: (glyph start, value start, value end).
///
/// The value is one word, or with `to_next_marker` everything up to the
/// next glyph or block id. A glyph followed directly by another glyph has
/// an empty value.
fn marker_span(line: &str, glyph: &str, glyphs: &TaskGlyphs, to_next_marker: bool) -> Option<(usize, usize, usize)> {
    let pos = line.find(glyph)?;
    let mut after = pos + glyph.len();
    if line[after..].starts_with(VARIATION_SELECTOR) {
        after += VARIATION_SELECTOR.len_utf8();
    }
    let rest = &line[after..];
    let value_start = after + (rest.len() - rest.trim_start().len());
    let rest = &line[value_start..];

    let next_glyph = glyphs
        .all_glyphs()
        .into_iter()
        .filter_map(|g| rest.find(g))
        .min()
        .unwrap_or(rest.len());
    let len = if to_next_marker {
        let stop = block_id_start(rest).map_or(next_glyph, |b| b.min(next_glyph));
        rest[..stop].trim_end().len()
    } else if next_glyph == 0 {
        0
    } else {
        rest.find(char::is_whitespace).unwrap_or(rest.len())
    };
    Some((pos, value_start, value_start + len))
}

// Rewrite the value of an existing marker in place, or append a new marker.
fn set_marker(line: &str, glyph: &str, value: &str, glyphs: &TaskGlyphs, to_next_marker: bool) -> String {
    match marker_span(line, glyph, glyphs, to_next_marker) {
        Some((_, start, end)) if start == end => {
            let (head, tail) = (line[..start].trim_end(), &line[end..]);
            if tail.is_empty() {
                format!("{} {}", head, value)
            } else {
                format!("{} {} {}", head, value, tail)
            }
        }
        Some((_, start, end)) => format!("{}{}{}", &line[..start], value, &line[end..]),
        None => insert_before_block_id(line, &format!("{} {}", glyph, value)),
    }
}

// Drop every `glyph` marker with its value and the whitespace before it.
fn clear_marker(line: &str, glyph: &str, glyphs: &TaskGlyphs, to_next_marker: bool) -> String {
    let mut out = line.to_string();
    while let Some((pos, _, end)) = marker_span(&out, glyph, glyphs, to_next_marker) {
        let start = out[..pos].trim_end().len();
        out.replace_range(start..end, "");
    }
    out
}

// Swap the first priority glyph for the new tier and drop any others.
// `Normal` has no glyph, so every priority glyph goes.
fn set_priority(line: &str, priority: Priority, glyphs: &TaskGlyphs) -> String {
    let wanted = glyphs.priority_glyph(priority);
    let mut found: Vec<(usize, usize)> = glyphs
        .priorities
        .iter()
        .flat_map(|p| line.match_indices(p.glyph.as_str()).map(|(i, g)| (i, i + g.len())))
        .collect();
    found.sort_unstable();

    let mut out = line.to_string();
    for &(start, end) in found.iter().skip(usize::from(wanted.is_some())).rev() {
        let end = if out[end..].starts_with(VARIATION_SELECTOR) {
            end + VARIATION_SELECTOR.len_utf8()
        } else {
            end
        };
        let start = out[..start].trim_end().len();
        out.replace_range(start..end, "");
    }
    match (wanted, found.first()) {
        (Some(glyph), Some(&(start, end))) => out.replace_range(start..end, glyph),
        (Some(glyph), None) => out = insert_before_block_id(&out, glyph),
        (None, _) => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p() -> &'static Path {
        Path::new("t.md")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_create_task_renders_metadata() {
        let task = NewTask {
            text: "Review PR".into(),
            due: Some(date("2025-11-01")),
            priority: Some(Priority::High),
            ..NewTask::default()
        };
        let (out, line) =
            create_task("# Todo\n", p(), &task, &TaskPosition::End, &TaskGlyphs::default()).unwrap();
        assert_eq!(line, 2);
        assert_eq!(out, "# Todo\n- [ ] Review PR 🔼 📅 2025-11-01\n");

        let parsed = &Note::parse("t.md", out).tasks(&TaskGlyphs::default())[0];
        assert_eq!(parsed.due, Some(date("2025-11-01")));
        assert_eq!(parsed.priority, Priority::High);
    }

    #[test]
    fn test_create_task_positions() {
        let content = "---\na: 1\n---\n# Todo\n- [ ] old\n";
        let glyphs = TaskGlyphs::default();
        let task = NewTask {
            text: "new".into(),
            ..NewTask::default()
        };
        let (out, line) = create_task(content, p(), &task, &TaskPosition::Top, &glyphs).unwrap();
        assert_eq!(line, 4);
        assert_eq!(out, "---\na: 1\n---\n- [ ] new\n# Todo\n- [ ] old\n");

        let (out, _) =
            create_task(content, p(), &task, &TaskPosition::AfterHeading("Todo".into()), &glyphs).unwrap();
        assert_eq!(out, "---\na: 1\n---\n# Todo\n- [ ] new\n- [ ] old\n");

        assert!(matches!(
            create_task(content, p(), &task, &TaskPosition::AfterHeading("Nope".into()), &glyphs),
            Err(VaultError::HeadingNotFound { .. })
        ));
    }

    #[test]
    fn test_create_task_rejects_bad_recurrence() {
        let task = NewTask {
            text: "x".into(),
            recurrence: Some("weekly".into()),
            ..NewTask::default()
        };
        assert!(matches!(
            create_task("", p(), &task, &TaskPosition::End, &TaskGlyphs::default()),
            Err(VaultError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn test_toggle_stamps_and_unstamps() {
        let glyphs = TaskGlyphs::default();
        let content = "- [ ] Ship it 📅 2025-01-10 ^ship\n";
        let (done, completed) = toggle_task(content, p(), 1, Some(date("2025-01-09")), &glyphs).unwrap();
        assert!(completed);
        assert_eq!(done, "- [x] Ship it 📅 2025-01-10 ✅ 2025-01-09 ^ship\n");

        let (open, completed) = toggle_task(&done, p(), 1, None, &glyphs).unwrap();
        assert!(!completed);
        assert_eq!(open, content);
    }

    #[test]
    fn test_toggle_without_stamp() {
        let (out, _) = toggle_task("- [ ] a\n", p(), 1, None, &TaskGlyphs::default()).unwrap();
        assert_eq!(out, "- [x] a\n");
    }

    #[test]
    fn test_toggle_non_task_line() {
        assert!(matches!(
            toggle_task("plain\n", p(), 1, None, &TaskGlyphs::default()),
            Err(VaultError::TaskNotFound { line: 1, .. })
        ));
        assert!(matches!(
            toggle_task("- [ ] a\n", p(), 5, None, &TaskGlyphs::default()),
            Err(VaultError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_update_task_metadata() {
        let glyphs = TaskGlyphs::default();
        let content = "Intro\n  - [ ] Pay rent 📅 2025-01-01 ⏬\n";
        let update = TaskUpdate {
            priority: Some(Priority::Highest),
            due: FieldChange::Clear,
            recurrence: FieldChange::Set("every month".into()),
            ..TaskUpdate::default()
        };
        let out = update_task(content, p(), 2, &update, &glyphs).unwrap();
        assert_eq!(out, "Intro\n  - [ ] Pay rent ⏫ 🔁 every month\n");

        let bad = TaskUpdate {
            recurrence: FieldChange::Set("monthly".into()),
            ..TaskUpdate::default()
        };
        assert!(matches!(
            update_task(content, p(), 2, &bad, &glyphs),
            Err(VaultError::InvalidRecurrence(_))
        ));
    }

    fn set_priority_on(line: &str, priority: Priority) -> String {
        let update = TaskUpdate {
            priority: Some(priority),
            ..TaskUpdate::default()
        };
        update_task(line, p(), 1, &update, &TaskGlyphs::default()).unwrap()
    }

    #[test]
    fn test_update_keeps_unparseable_tokens() {
        assert_eq!(
            set_priority_on("- [ ] Pay 📅 2025-13-45 🔼 #tag", Priority::Highest),
            "- [ ] Pay 📅 2025-13-45 ⏫ #tag"
        );
        assert_eq!(
            set_priority_on("- [ ] Pay 📅 2025-13-45 🔼 #tag", Priority::High),
            "- [ ] Pay 📅 2025-13-45 🔼 #tag"
        );
    }

    #[test]
    fn test_update_edits_markers_in_place() {
        let glyphs = TaskGlyphs::default();
        let update = TaskUpdate {
            due: FieldChange::Set(date("2025-02-01")),
            ..TaskUpdate::default()
        };
        let out = update_task("- [ ] Pay 📅 2025-01-01 #home 🔼", p(), 1, &update, &glyphs).unwrap();
        assert_eq!(out, "- [ ] Pay 📅 2025-02-01 #home 🔼");

        assert_eq!(set_priority_on("- [ ] Pay  rent   🔼", Priority::Low), "- [ ] Pay  rent   🔽");
        assert_eq!(set_priority_on("- [ ] Pay  rent ⏫ #x", Priority::Normal), "- [ ] Pay  rent #x");

        let out = update_task("- [ ] Pay ^blk\n", p(), 1, &update, &glyphs).unwrap();
        assert_eq!(out, "- [ ] Pay 📅 2025-02-01 ^blk\n");
    }

    #[test]
    fn test_update_recurrence_in_place() {
        let glyphs = TaskGlyphs::default();
        let content = "- [ ] Water 🔁 every week 📅 2025-01-01\n";
        let set = TaskUpdate {
            recurrence: FieldChange::Set("every day".into()),
            ..TaskUpdate::default()
        };
        assert_eq!(
            update_task(content, p(), 1, &set, &glyphs).unwrap(),
            "- [ ] Water 🔁 every day 📅 2025-01-01\n"
        );
        let clear = TaskUpdate {
            recurrence: FieldChange::Clear,
            ..TaskUpdate::default()
        };
        assert_eq!(
            update_task(content, p(), 1, &clear, &glyphs).unwrap(),
            "- [ ] Water 📅 2025-01-01\n"
        );
    }
}
