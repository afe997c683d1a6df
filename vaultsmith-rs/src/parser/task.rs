//! Checkbox task parsing with glyph metadata (dates, priority, recurrence).

use crate::config::TaskGlyphs;
use crate::error::{Result, VaultError};
use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use crate::types::{Priority, Task, TaskLocation};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Optional indent, a list marker, `[symbol]`, then the rest.
static TASK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*(?:[-*+]|\d+[.)]) \[)(.)\](?: (.*))?$").unwrap());

static BLOCK_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\^([a-zA-Z0-9_-]+)\s*$").unwrap());

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([a-zA-Z_][\w/-]*)").unwrap());

const VARIATION_SELECTOR: char = '\u{FE0F}';

#[derive(Debug, Clone, Copy, PartialEq)]
enum Marker {
    Due,
    Scheduled,
    Start,
    Done,
    Created,
    Recurrence,
    Priority(Priority),
}

impl Marker {
    fn label(self) -> &'static str {
        match self {
            Marker::Due => "due",
            Marker::Scheduled => "scheduled",
            Marker::Start => "start",
            Marker::Done => "done",
            Marker::Created => "created",
            Marker::Recurrence => "recurrence",
            Marker::Priority(_) => "priority",
        }
    }
}

fn markers(glyphs: &TaskGlyphs) -> Vec<(&str, Marker)> {
    let mut markers = vec![
        (glyphs.due.as_str(), Marker::Due),
        (glyphs.scheduled.as_str(), Marker::Scheduled),
        (glyphs.start.as_str(), Marker::Start),
        (glyphs.done.as_str(), Marker::Done),
        (glyphs.created.as_str(), Marker::Created),
        (glyphs.recurrence.as_str(), Marker::Recurrence),
    ];
    markers.extend(
        glyphs
            .priorities
            .iter()
            .map(|p| (p.glyph.as_str(), Marker::Priority(p.priority))),
    );
    markers.retain(|(g, _)| !g.is_empty());
    markers
}

/// Parse all tasks from content, skipping fenced code.
pub fn parse_tasks(content: &str, file: &Path, glyphs: &TaskGlyphs) -> Vec<Task> {
    let code_ranges = find_code_ranges(content);

    content
        .lines()
        .enumerate()
        .filter(|(idx, _)| !is_line_fenced(idx + 1, &code_ranges))
        .filter_map(|(idx, line)| parse_task_line(line, idx + 1, file, glyphs))
        .collect()
}

/// Parse a single line as a task. Returns `None` if it is not a checkbox item.
pub fn parse_task_line(line: &str, line_num: usize, file: &Path, glyphs: &TaskGlyphs) -> Option<Task> {
    let caps = TASK_REGEX.captures(line)?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let symbol = caps[2].chars().next().unwrap_or(' ');
    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let (rest, block_id) = match BLOCK_ID_REGEX.captures(rest) {
        Some(c) => (
            rest[..c.get(0).map(|m| m.start()).unwrap_or(rest.len())].to_string(),
            Some(c[1].to_string()),
        ),
        None => (rest.to_string(), None),
    };

    let mut task = Task {
        location: TaskLocation {
            file: file.to_path_buf(),
            line: line_num,
        },
        raw: line.to_string(),
        symbol,
        completed: symbol == 'x' || symbol == 'X',
        description: String::new(),
        indent: count_indent(prefix),
        due: None,
        scheduled: None,
        start: None,
        done: None,
        created: None,
        priority: Priority::Normal,
        recurrence: None,
        tags: Vec::new(),
        block_id,
        warnings: Vec::new(),
    };

    task.description = extract_metadata(&rest, glyphs, &mut task);
    task.tags = TAG_REGEX
        .captures_iter(&task.description)
        .map(|c| c[1].to_string())
        .collect();

    for warning in &task.warnings {
        tracing::debug!(file = %file.display(), line = line_num, "{}", warning);
    }

    Some(task)
}

/// Pull glyph metadata out of `text` into `task`, returning the leftover description.
fn extract_metadata(text: &str, glyphs: &TaskGlyphs, task: &mut Task) -> String {
    let markers = markers(glyphs);

    let mut hits: Vec<(usize, usize, Marker)> = markers
        .iter()
        .flat_map(|(glyph, marker)| {
            text.match_indices(glyph)
                .map(move |(pos, _)| (pos, pos + glyph.len(), *marker))
        })
        .collect();
    hits.sort_by_key(|(pos, _, _)| *pos);

    let mut kept = String::new();
    let mut cursor = 0;
    let mut priority: Option<Priority> = None;

    for (i, &(pos, glyph_end, marker)) in hits.iter().enumerate() {
        if pos < cursor {
            continue;
        }
        kept.push_str(&text[cursor..pos]);

        let next = hits.get(i + 1).map(|h| h.0).unwrap_or(text.len());
        let segment = &text[glyph_end..next];
        let body = segment.trim_start_matches(VARIATION_SELECTOR);
        let lead = segment.len() - body.trim_start().len();
        let body = body.trim_start();

        cursor = match marker {
            Marker::Priority(p) => {
                match priority {
                    Some(existing) if existing != p => task.warnings.push(format!(
                        "conflicting priority markers ({} and {}); keeping {}",
                        existing, p, existing
                    )),
                    Some(_) => {}
                    None => priority = Some(p),
                }
                glyph_end + (segment.len() - segment.trim_start_matches(VARIATION_SELECTOR).len())
            }
            Marker::Recurrence => {
                let rule = body.trim();
                if rule.is_empty() {
                    task.warnings.push("recurrence marker without a rule".to_string());
                } else {
                    task.recurrence = Some(rule.to_string());
                }
                next
            }
            date_marker => {
                let word = body.split_whitespace().next().unwrap_or("");
                match NaiveDate::parse_from_str(word, "%Y-%m-%d") {
                    Ok(date) => {
                        let slot = match date_marker {
                            Marker::Due => &mut task.due,
                            Marker::Scheduled => &mut task.scheduled,
                            Marker::Start => &mut task.start,
                            Marker::Done => &mut task.done,
                            _ => &mut task.created,
                        };
                        *slot = Some(date);
                    }
                    Err(_) if word.is_empty() => task
                        .warnings
                        .push(format!("{} marker without a date", date_marker.label())),
                    Err(_) => task.warnings.push(format!(
                        "unparseable {} date '{}'",
                        date_marker.label(),
                        word
                    )),
                }
                glyph_end + lead + word.len()
            }
        };
    }
    kept.push_str(&text[cursor.min(text.len())..]);

    task.priority = priority.unwrap_or(Priority::Normal);
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count indentation level (tabs or 4 spaces = 1 level).
fn count_indent(s: &str) -> usize {
    let mut spaces = 0;
    let mut tabs = 0;
    for c in s.chars() {
        match c {
            '\t' => tabs += 1,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    tabs + spaces / 4
}

/// Render a task back into a line, keeping the original indent and list marker.
///
/// Metadata is emitted in a fixed order: priority, start, scheduled, due,
/// done, created, recurrence, then the block id.
pub fn format_task_line(task: &Task, glyphs: &TaskGlyphs) -> String {
    let prefix = TASK_REGEX
        .captures(&task.raw)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| "- [".to_string());

    let mut parts = Vec::new();
    if !task.description.is_empty() {
        parts.push(task.description.clone());
    }
    if let Some(glyph) = glyphs.priority_glyph(task.priority) {
        parts.push(glyph.to_string());
    }
    for (glyph, date) in [
        (&glyphs.start, task.start),
        (&glyphs.scheduled, task.scheduled),
        (&glyphs.due, task.due),
        (&glyphs.done, task.done),
        (&glyphs.created, task.created),
    ] {
        if let Some(date) = date {
            parts.push(format!("{} {}", glyph, date.format("%Y-%m-%d")));
        }
    }
    if let Some(ref rule) = task.recurrence {
        parts.push(format!("{} {}", glyphs.recurrence, rule));
    }
    if let Some(ref id) = task.block_id {
        parts.push(format!("^{}", id));
    }

    format!("{}{}] {}", prefix, task.symbol, parts.join(" "))
}

/// Replace the checkbox symbol of a task line, leaving the rest untouched.
pub fn set_task_symbol(line: &str, symbol: char) -> Option<String> {
    let caps = TASK_REGEX.captures(line)?;
    let prefix = caps.get(1)?;
    let after = caps.get(2)?.end();
    Some(format!("{}{}{}", prefix.as_str(), symbol, &line[after..]))
}

/// Parse a date argument: `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday`, or `+3d` / `-1w` / `+2m`.
pub fn parse_date_arg(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let lower = input.trim().to_lowercase();
    match lower.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(offset) = lower.strip_prefix('+').or_else(|| lower.strip_prefix('-')) {
        let negative = lower.starts_with('-');
        if offset.len() >= 2 {
            let (amount, unit) = offset.split_at(offset.len() - 1);
            if let Ok(amount) = amount.parse::<i64>() {
                let amount = if negative { -amount } else { amount };
                let delta = match unit {
                    "d" => Some(Duration::days(amount)),
                    "w" => Some(Duration::weeks(amount)),
                    // approximate month
                    "m" => Some(Duration::days(amount * 30)),
                    _ => None,
                };
                if let Some(delta) = delta {
                    return Ok(today + delta);
                }
            }
        }
    }

    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| VaultError::InvalidDate(input.to_string()))
}
