//! Read-only queries over a vault: notes by tag, inline fields, tasks.
//!
//! Every query walks the vault once and reads each note fresh; only the
//! matching rows are kept.

use crate::config::TagConfig;
use crate::error::Result;
use crate::note::Note;
use crate::parser::canonical_key;
use crate::scan::ScanWarning;
use crate::types::{InlineField, Priority, Task};
use crate::vault::Vault;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Visit every readable note. Returns the paths the walk could not enter
/// and the notes that could not be read.
pub(crate) fn for_each_note(vault: &Vault, mut visit: impl FnMut(Note)) -> Result<Vec<ScanWarning>> {
    let scanner = vault.notes()?;
    let mut walk = scanner.iter();
    let mut skipped = Vec::new();
    for path in walk.by_ref() {
        match vault.load_note(&path) {
            Ok(note) => visit(note),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable note");
                skipped.push(ScanWarning {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }
    skipped.extend(walk.into_warnings());
    Ok(skipped)
}

/// Whether tag `name` is `query` or nested below it (`a` matches `a/b`).
pub fn tag_matches(policy: &TagConfig, name: &str, query: &str) -> bool {
    let query = query.trim().trim_start_matches('#');
    // case folding can change byte lengths, so compare whole path segments
    policy.matches(name, query)
        || name
            .match_indices('/')
            .any(|(i, _)| policy.matches(&name[..i], query))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedNote {
    pub path: PathBuf,
    /// The note's tags that matched, as written.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSearch {
    pub notes: Vec<TaggedNote>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanWarning>,
}

/// Notes carrying `tag` in the header or body, sorted by path.
pub fn find_notes_by_tag(vault: &Vault, tag: &str) -> Result<TagSearch> {
    let policy = &vault.config.tags;
    let mut found = Vec::new();
    let skipped = for_each_note(vault, |note| {
        let tags: Vec<String> = note
            .tag_set()
            .into_iter()
            .filter(|t| tag_matches(policy, &t.name, tag))
            .map(|t| t.name)
            .collect();
        if !tags.is_empty() {
            found.push(TaggedNote { path: note.path, tags });
        }
    })?;
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(TagSearch {
        notes: found,
        skipped,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    pub path: PathBuf,
    #[serde(flatten)]
    pub field: InlineField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSearch {
    pub matches: Vec<FieldMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanWarning>,
}

/// Inline fields with the given key, optionally restricted to a value.
///
/// Keys compare canonically; values compare trimmed and case-insensitively.
pub fn search_fields(vault: &Vault, key: &str, value: Option<&str>) -> Result<FieldSearch> {
    let wanted = canonical_key(key);
    let value = value.map(|v| v.trim().to_lowercase());
    let mut found = Vec::new();
    let skipped = for_each_note(vault, |note| {
        for field in note.inline_fields() {
            if field.canonical_key != wanted {
                continue;
            }
            if value.as_deref().is_some_and(|v| field.value.trim().to_lowercase() != v) {
                continue;
            }
            found.push(FieldMatch {
                path: note.path.clone(),
                field,
            });
        }
    })?;
    found.sort_by(|a, b| a.path.cmp(&b.path).then(a.field.line.cmp(&b.field.line)));
    Ok(FieldSearch {
        matches: found,
        skipped,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Completed,
    #[default]
    All,
}

/// Task search criteria. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFilter {
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub due_before: Option<NaiveDate>,
    pub due_after: Option<NaiveDate>,
    /// Due between today and today + N days, inclusive.
    pub due_within_days: Option<i64>,
    pub scheduled_before: Option<NaiveDate>,
    pub scheduled_after: Option<NaiveDate>,
    pub scheduled_within_days: Option<i64>,
    pub has_recurrence: Option<bool>,
    pub tag: Option<String>,
}

fn within(date: Option<NaiveDate>, today: NaiveDate, days: Option<i64>) -> bool {
    match days {
        None => true,
        Some(days) => date.is_some_and(|d| d >= today && d <= today + Duration::days(days)),
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: NaiveDate, policy: &TagConfig) -> bool {
        let status = match self.status {
            TaskStatus::Open => !task.completed,
            TaskStatus::Completed => task.completed,
            TaskStatus::All => true,
        };
        let before = |date: Option<NaiveDate>, bound: Option<NaiveDate>| {
            bound.is_none_or(|b| date.is_some_and(|d| d < b))
        };
        let after = |date: Option<NaiveDate>, bound: Option<NaiveDate>| {
            bound.is_none_or(|b| date.is_some_and(|d| d > b))
        };

        status
            && self.priority.is_none_or(|p| task.priority == p)
            && before(task.due, self.due_before)
            && after(task.due, self.due_after)
            && within(task.due, today, self.due_within_days)
            && before(task.scheduled, self.scheduled_before)
            && after(task.scheduled, self.scheduled_after)
            && within(task.scheduled, today, self.scheduled_within_days)
            && self
                .has_recurrence
                .is_none_or(|want| task.recurrence.is_some() == want)
            && self.tag.as_deref().is_none_or(|tag| {
                let tag = tag.trim_start_matches('#');
                task.tags.iter().any(|t| policy.matches(t, tag))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskSort {
    /// Due date; undated tasks always last.
    #[default]
    Due,
    /// Highest priority first.
    Priority,
    File,
    Line,
}

fn by_location(a: &Task, b: &Task) -> Ordering {
    a.location
        .file
        .cmp(&b.location.file)
        .then(a.location.line.cmp(&b.location.line))
}

/// Order `tasks` in place. Ties fall back to file and line.
pub fn sort_tasks(tasks: &mut [Task], sort: TaskSort, descending: bool) {
    let flip = |o: Ordering| if descending { o.reverse() } else { o };
    tasks.sort_by(|a, b| {
        let primary = match sort {
            TaskSort::Due => match (a.due, b.due) {
                (Some(x), Some(y)) => flip(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            TaskSort::Priority => flip(b.priority.cmp(&a.priority)),
            TaskSort::File => flip(a.location.file.cmp(&b.location.file)),
            TaskSort::Line => flip(by_location(a, b)),
        };
        primary.then_with(|| by_location(a, b))
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSearch {
    pub tasks: Vec<Task>,
    /// Matches before the limit was applied.
    pub total: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ScanWarning>,
}

/// Find, order and cap tasks across the vault.
pub fn search_tasks(
    vault: &Vault,
    filter: &TaskFilter,
    sort: TaskSort,
    descending: bool,
    limit: Option<usize>,
    today: NaiveDate,
) -> Result<TaskSearch> {
    let mut tasks = Vec::new();
    let skipped = for_each_note(vault, |note| {
        tasks.extend(
            note.tasks(&vault.config.tasks)
                .into_iter()
                .filter(|t| filter.matches(t, today, &vault.config.tags)),
        );
    })?;

    sort_tasks(&mut tasks, sort, descending);
    let total = tasks.len();
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
    Ok(TaskSearch {
        truncated: tasks.len() < total,
        tasks,
        total,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_vault() -> (TempDir, Vault) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("work")).unwrap();
        fs::write(
            root.join("work/Plan.md"),
            "---\ntags: [project/active]\n---\nstatus:: Active\n\n- [ ] Draft outline ⏫ 📅 2025-01-10 #writing\n- [x] Kickoff ✅ 2025-01-02\n",
        )
        .unwrap();
        fs::write(
            root.join("Journal.md"),
            "Notes on #Project today. [mood:: calm]\n\n- [ ] Water plants 🔁 every week 📅 2025-01-06\n- [ ] Someday\n",
        )
        .unwrap();
        fs::write(root.join("Other.md"), "#projects are not #project\nstatus:: done\n").unwrap();
        let vault = Vault::new(root, Config::default()).unwrap();
        (temp, vault)
    }

    #[test]
    fn test_tag_matches_nested_and_case() {
        let policy = TagConfig::default();
        assert!(tag_matches(&policy, "project/active", "project"));
        assert!(tag_matches(&policy, "Project", "#project"));
        assert!(!tag_matches(&policy, "projects", "project"));

        let strict = TagConfig { case_sensitive: true };
        assert!(!tag_matches(&strict, "Project", "project"));
        assert!(!tag_matches(&strict, "Project/x", "project"));
    }

    #[test]
    fn test_tag_matches_when_case_changes_byte_length() {
        let policy = TagConfig::default();
        // "ẞ" is three bytes, its lowercase "ß" two
        assert!(tag_matches(&policy, "ẞeta/draft", "ßeta"));
        assert!(tag_matches(&policy, "\u{212A}elvin/x", "#kelvin"));
        assert!(tag_matches(&policy, "area/sub/leaf", "area/sub"));
        assert!(!tag_matches(&policy, "ẞetas/draft", "ßeta"));
    }

    #[test]
    fn test_find_notes_by_tag() {
        let (_temp, vault) = create_test_vault();
        let found = find_notes_by_tag(&vault, "project").unwrap().notes;
        let paths: Vec<_> = found.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("Journal.md"),
                PathBuf::from("Other.md"),
                PathBuf::from("work/Plan.md")
            ]
        );
        assert_eq!(found[2].tags, vec!["project/active"]);
    }

    #[test]
    fn test_search_fields() {
        let (_temp, vault) = create_test_vault();
        let all = search_fields(&vault, "Status", None).unwrap().matches;
        assert_eq!(all.len(), 2);

        let active = search_fields(&vault, "status", Some("active")).unwrap().matches;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].path, PathBuf::from("work/Plan.md"));
        assert_eq!(active[0].field.line, 4);
    }

    #[test]
    fn test_search_tasks_filters() {
        let (_temp, vault) = create_test_vault();
        let today = date("2025-01-05");

        let open = TaskFilter {
            status: TaskStatus::Open,
            ..TaskFilter::default()
        };
        let result = search_tasks(&vault, &open, TaskSort::Due, false, None, today).unwrap();
        let names: Vec<_> = result.tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Water plants", "Draft outline #writing", "Someday"]);

        let soon = TaskFilter {
            due_within_days: Some(3),
            ..TaskFilter::default()
        };
        let result = search_tasks(&vault, &soon, TaskSort::Due, false, None, today).unwrap();
        assert_eq!(result.total, 1);

        let tagged = TaskFilter {
            tag: Some("#writing".into()),
            ..TaskFilter::default()
        };
        let result = search_tasks(&vault, &tagged, TaskSort::File, false, None, today).unwrap();
        assert_eq!(result.tasks[0].priority, Priority::Highest);

        let recurring = TaskFilter {
            has_recurrence: Some(true),
            ..TaskFilter::default()
        };
        let result = search_tasks(&vault, &recurring, TaskSort::Due, false, None, today).unwrap();
        assert_eq!(result.total, 1);
    }

    #[test]
    fn test_search_tasks_sort_and_limit() {
        let (_temp, vault) = create_test_vault();
        let today = date("2025-01-05");
        let result =
            search_tasks(&vault, &TaskFilter::default(), TaskSort::Priority, false, Some(2), today)
                .unwrap();
        assert_eq!(result.total, 4);
        assert!(result.truncated);
        assert_eq!(result.tasks.len(), 2);
        assert_eq!(result.tasks[0].description, "Draft outline #writing");

        let result =
            search_tasks(&vault, &TaskFilter::default(), TaskSort::Due, true, None, today).unwrap();
        let due: Vec<_> = result.tasks.iter().map(|t| t.due).collect();
        assert_eq!(due[0], Some(date("2025-01-10")));
        assert_eq!(due[3], None);
    }

    #[test]
    fn test_unreadable_notes_are_reported() {
        let (temp, vault) = create_test_vault();
        fs::write(temp.path().join("Broken.md"), [0x23, 0x70, 0xff, 0xfe, 0x0a]).unwrap();

        let found = find_notes_by_tag(&vault, "project").unwrap();
        assert_eq!(found.notes.len(), 3);
        assert_eq!(found.skipped.len(), 1);
        assert_eq!(found.skipped[0].path, PathBuf::from("Broken.md"));

        let fields = search_fields(&vault, "status", None).unwrap();
        assert_eq!(fields.matches.len(), 2);
        assert_eq!(fields.skipped.len(), 1);

        let tasks =
            search_tasks(&vault, &TaskFilter::default(), TaskSort::Due, false, None, date("2025-01-05"))
                .unwrap();
        assert_eq!(tasks.total, 4);
        assert_eq!(tasks.skipped[0].path, PathBuf::from("Broken.md"));
    }
}
