//! Per-note and vault-wide statistics.
//!
//! Vault statistics piggyback on the link graph's single streaming pass:
//! each note is measured as it is read, then degrees are filled in from the
//! finished graph.

use crate::config::TaskGlyphs;
use crate::error::Result;
use crate::graph::{LinkGraph, ratio};
use crate::note::Note;
use crate::parser::code_block::{find_code_ranges, is_line_fenced};
use crate::query::for_each_note;
use crate::scan::ScanWarning;
use crate::types::{LinkKind, Priority, Task};
use crate::vault::Vault;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteStats {
    pub path: PathBuf,
    /// Words in the body, fenced code excluded.
    pub words: usize,
    pub characters: usize,
    pub lines: usize,
    pub headings: usize,
    pub tags: usize,
    pub wikilinks: usize,
    pub markdown_links: usize,
    pub in_links: usize,
    pub out_links: usize,
    pub tasks: usize,
    pub tasks_completed: usize,
    pub tasks_open: usize,
    pub code_blocks: usize,
}

impl NoteStats {
    /// Counts derivable from the note alone; link degrees are left at zero.
    pub fn measure(note: &Note, glyphs: &TaskGlyphs) -> Self {
        let body = note.body();
        let fences = find_code_ranges(body);
        let words = body
            .lines()
            .enumerate()
            .filter(|(idx, _)| !is_line_fenced(idx + 1, &fences))
            .map(|(_, line)| line.split_whitespace().count())
            .sum();

        let links = note.links();
        let tasks = note.tasks(glyphs);
        let tasks_completed = tasks.iter().filter(|t| t.completed).count();

        NoteStats {
            path: note.path.clone(),
            words,
            characters: body.chars().count(),
            lines: note.line_count(),
            headings: note.headings().len(),
            tags: note.tag_set().len(),
            wikilinks: links.iter().filter(|l| l.kind == LinkKind::Wiki).count(),
            markdown_links: links.iter().filter(|l| l.kind == LinkKind::Markdown).count(),
            in_links: 0,
            out_links: 0,
            tasks: tasks.len(),
            tasks_completed,
            tasks_open: tasks.len() - tasks_completed,
            code_blocks: fences.iter().filter(|r| r.fenced).count(),
        }
    }

    /// Fill in resolved link degrees.
    pub fn with_degrees(mut self, graph: &LinkGraph) -> Self {
        self.in_links = graph.in_degree(&self.path);
        self.out_links = graph.out_degree(&self.path);
        self
    }
}

/// Statistics for one note, with degrees from a fresh graph of the vault.
pub fn note_stats(vault: &Vault, path: &Path) -> Result<NoteStats> {
    let note = vault.load_note(path)?;
    let graph = LinkGraph::build(vault)?;
    Ok(NoteStats::measure(&note, &vault.config.tasks).with_degrees(&graph))
}

/// Distribution of one per-note count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
}

impl Summary {
    pub fn of(values: impl IntoIterator<Item = usize>) -> Self {
        let mut values: Vec<usize> = values.into_iter().collect();
        if values.is_empty() {
            return Summary::default();
        }
        values.sort_unstable();
        let n = values.len();
        let total: usize = values.iter().sum();
        let median = if n % 2 == 1 {
            values[n / 2] as f64
        } else {
            (values[n / 2 - 1] + values[n / 2]) as f64 / 2.0
        };
        Summary {
            total,
            min: values[0],
            max: values[n - 1],
            mean: ratio(total, n),
            median,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VaultStats {
    pub notes: usize,
    pub words: Summary,
    pub tags: Summary,
    pub headings: Summary,
    pub in_links: Summary,
    pub out_links: Summary,
    pub tasks: Summary,
    pub total_links: usize,
    pub broken_links: usize,
    pub unique_tags: usize,
    /// Notes carrying each tag, by exact name.
    pub tag_frequencies: BTreeMap<String, usize>,
    pub orphans: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanWarning>,
    /// Per-note rows, sorted by path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_note: Vec<NoteStats>,
}

impl VaultStats {
    /// Measure every note in one pass over the vault.
    pub fn collect(vault: &Vault) -> Result<Self> {
        let glyphs = &vault.config.tasks;
        let mut rows = Vec::new();
        let mut tag_frequencies: BTreeMap<String, usize> = BTreeMap::new();

        let graph = LinkGraph::build_with(vault, |note| {
            rows.push(NoteStats::measure(note, glyphs));
            for tag in note.tag_set() {
                *tag_frequencies.entry(tag.name).or_default() += 1;
            }
        })?;

        let mut rows: Vec<NoteStats> = rows.into_iter().map(|r| r.with_degrees(&graph)).collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        let connectivity = graph.connectivity();

        Ok(VaultStats {
            notes: rows.len(),
            words: Summary::of(rows.iter().map(|r| r.words)),
            tags: Summary::of(rows.iter().map(|r| r.tags)),
            headings: Summary::of(rows.iter().map(|r| r.headings)),
            in_links: Summary::of(rows.iter().map(|r| r.in_links)),
            out_links: Summary::of(rows.iter().map(|r| r.out_links)),
            tasks: Summary::of(rows.iter().map(|r| r.tasks)),
            total_links: connectivity.links,
            broken_links: connectivity.broken,
            unique_tags: tag_frequencies.len(),
            tag_frequencies,
            orphans: connectivity.zero_degree,
            skipped: graph.skipped().to_vec(),
            per_note: rows,
        })
    }
}

/// Task counts over a set of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub completed: usize,
    pub by_priority: BTreeMap<String, usize>,
    /// Open tasks due before today.
    pub overdue: usize,
    /// Open tasks due today or within the next seven days.
    pub due_this_week: usize,
    pub recurring: usize,
    pub with_warnings: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanWarning>,
}

impl TaskStats {
    pub fn from_tasks<'t>(tasks: impl IntoIterator<Item = &'t Task>, today: NaiveDate) -> Self {
        let week_end = today + Duration::days(7);
        let mut stats = TaskStats {
            by_priority: Priority::ALL.iter().map(|p| (p.to_string(), 0)).collect(),
            ..TaskStats::default()
        };

        for task in tasks {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            } else {
                stats.open += 1;
                match task.due {
                    Some(due) if due < today => stats.overdue += 1,
                    Some(due) if due <= week_end => stats.due_this_week += 1,
                    _ => {}
                }
            }
            *stats.by_priority.entry(task.priority.to_string()).or_default() += 1;
            if task.recurrence.is_some() {
                stats.recurring += 1;
            }
            if !task.warnings.is_empty() {
                stats.with_warnings += 1;
            }
        }
        stats
    }

    /// Task statistics for the whole vault, streamed note by note.
    pub fn collect(vault: &Vault, today: NaiveDate) -> Result<Self> {
        let mut all = Vec::new();
        let skipped = for_each_note(vault, |note| all.extend(note.tasks(&vault.config.tasks)))?;
        Ok(Self {
            skipped,
            ..Self::from_tasks(&all, today)
        })
    }
}
