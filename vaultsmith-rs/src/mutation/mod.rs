//! Format-preserving edits to notes and diagrams.
//!
//! Each edit re-reads the file, applies one transformation to its text and
//! persists the result through a temp file and rename. Transformations are
//! plain functions over `&str`, so they can be tested without a vault.

pub mod board;
pub mod canvas;
pub mod content;
pub mod fields;
pub mod header;
pub mod tags;
pub mod tasks;

use crate::error::{Result, VaultError};
use crate::types::FieldSyntax;
use crate::vault::Vault;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub use board::{NewCard, Position};
pub use canvas::{NewEdge, NewNode, NodeSpec};
pub use content::MatchPolicy;
pub use fields::FieldPosition;
pub use tasks::{FieldChange, NewTask, TaskPosition, TaskUpdate};

/// One edit, addressed to a vault-relative path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Mutation {
    SetHeaderField {
        path: PathBuf,
        key: String,
        value: serde_yaml::Value,
    },
    RemoveHeaderField {
        path: PathBuf,
        key: String,
    },
    AddTag {
        path: PathBuf,
        tag: String,
    },
    RemoveTag {
        path: PathBuf,
        tag: String,
    },
    InsertAfterHeading {
        path: PathBuf,
        heading: String,
        content: String,
        #[serde(default)]
        policy: MatchPolicy,
    },
    InsertAfterBlock {
        path: PathBuf,
        block_id: String,
        content: String,
        #[serde(default)]
        policy: MatchPolicy,
    },
    Append {
        path: PathBuf,
        content: String,
    },
    AddField {
        path: PathBuf,
        key: String,
        value: String,
        syntax: FieldSyntax,
        #[serde(default)]
        position: FieldPosition,
    },
    SetFieldValue {
        path: PathBuf,
        key: String,
        value: String,
        #[serde(default)]
        occurrence: Option<usize>,
    },
    RemoveField {
        path: PathBuf,
        key: String,
        #[serde(default)]
        line: Option<usize>,
    },
    CreateTask {
        path: PathBuf,
        task: NewTask,
        #[serde(default)]
        position: TaskPosition,
    },
    ToggleTask {
        path: PathBuf,
        line: usize,
        /// Stamped as the done date when the toggle completes the task.
        #[serde(default)]
        done_date: Option<NaiveDate>,
    },
    UpdateTask {
        path: PathBuf,
        line: usize,
        update: TaskUpdate,
    },
    AddCard {
        path: PathBuf,
        column: String,
        card: NewCard,
        #[serde(default)]
        position: Position,
    },
    MoveCard {
        path: PathBuf,
        from_column: String,
        card: String,
        to_column: String,
        #[serde(default)]
        position: Position,
    },
    ToggleCard {
        path: PathBuf,
        column: String,
        card: String,
    },
    AddNode {
        path: PathBuf,
        node: NewNode,
    },
    AddEdge {
        path: PathBuf,
        edge: NewEdge,
    },
    RemoveNode {
        path: PathBuf,
        node_id: String,
        #[serde(default = "cascade_default")]
        cascade: bool,
    },
    RemoveEdge {
        path: PathBuf,
        edge_id: String,
    },
}

fn cascade_default() -> bool {
    true
}

impl Mutation {
    pub fn path(&self) -> &Path {
        match self {
            Mutation::SetHeaderField { path, .. }
            | Mutation::RemoveHeaderField { path, .. }
            | Mutation::AddTag { path, .. }
            | Mutation::RemoveTag { path, .. }
            | Mutation::InsertAfterHeading { path, .. }
            | Mutation::InsertAfterBlock { path, .. }
            | Mutation::Append { path, .. }
            | Mutation::AddField { path, .. }
            | Mutation::SetFieldValue { path, .. }
            | Mutation::RemoveField { path, .. }
            | Mutation::CreateTask { path, .. }
            | Mutation::ToggleTask { path, .. }
            | Mutation::UpdateTask { path, .. }
            | Mutation::AddCard { path, .. }
            | Mutation::MoveCard { path, .. }
            | Mutation::ToggleCard { path, .. }
            | Mutation::AddNode { path, .. }
            | Mutation::AddEdge { path, .. }
            | Mutation::RemoveNode { path, .. }
            | Mutation::RemoveEdge { path, .. } => path,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Mutation::SetHeaderField { .. } => "set-header-field",
            Mutation::RemoveHeaderField { .. } => "remove-header-field",
            Mutation::AddTag { .. } => "add-tag",
            Mutation::RemoveTag { .. } => "remove-tag",
            Mutation::InsertAfterHeading { .. } => "insert-after-heading",
            Mutation::InsertAfterBlock { .. } => "insert-after-block",
            Mutation::Append { .. } => "append",
            Mutation::AddField { .. } => "add-field",
            Mutation::SetFieldValue { .. } => "set-field-value",
            Mutation::RemoveField { .. } => "remove-field",
            Mutation::CreateTask { .. } => "create-task",
            Mutation::ToggleTask { .. } => "toggle-task",
            Mutation::UpdateTask { .. } => "update-task",
            Mutation::AddCard { .. } => "add-card",
            Mutation::MoveCard { .. } => "move-card",
            Mutation::ToggleCard { .. } => "toggle-card",
            Mutation::AddNode { .. } => "add-node",
            Mutation::AddEdge { .. } => "add-edge",
            Mutation::RemoveNode { .. } => "remove-node",
            Mutation::RemoveEdge { .. } => "remove-edge",
        }
    }
}

/// What an applied edit did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationOutcome {
    pub path: PathBuf,
    /// False when the edit was a no-op and nothing was written.
    pub changed: bool,
    /// Line the edit landed on, where that is meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Id assigned to a new diagram element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
    /// Edges removed along with a diagram node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_edges: Vec<String>,
    /// Completion state after a toggle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// The result of a text transformation, before it is written.
#[derive(Debug, Default)]
pub(crate) struct Edit {
    pub content: String,
    pub line: Option<usize>,
    pub created_id: Option<String>,
    pub removed_edges: Vec<String>,
    pub completed: Option<bool>,
}

impl Edit {
    pub fn new(content: String) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Applies [`Mutation`]s to files in a vault.
pub struct Mutator<'a> {
    vault: &'a Vault,
}

impl<'a> Mutator<'a> {
    pub fn new(vault: &'a Vault) -> Self {
        Self { vault }
    }

    /// Apply one edit. On any error the file is left untouched.
    pub fn apply(&self, mutation: &Mutation) -> Result<MutationOutcome> {
        let config = &self.vault.config;
        let outcome = self.edit(mutation.path(), |text, path| match mutation {
            Mutation::SetHeaderField { key, value, .. } => {
                header::set_field(text, path, key, value).map(Edit::new)
            }
            Mutation::RemoveHeaderField { key, .. } => {
                header::remove_field(text, path, key).map(Edit::new)
            }
            Mutation::AddTag { tag, .. } => tags::add_tag(text, path, tag, &config.tags).map(Edit::new),
            Mutation::RemoveTag { tag, .. } => {
                tags::remove_tag(text, path, tag, &config.tags).map(Edit::new)
            }
            Mutation::InsertAfterHeading {
                heading,
                content: block,
                policy,
                ..
            } => content::insert_after_heading(text, path, heading, block, *policy)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::InsertAfterBlock {
                block_id,
                content: block,
                policy,
                ..
            } => content::insert_after_block(text, path, block_id, block, *policy)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::Append { content: block, .. } => Ok(Edit::new(content::append(text, block))),
            Mutation::AddField {
                key,
                value,
                syntax,
                position,
                ..
            } => fields::add_field(text, path, key, value, *syntax, position)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::SetFieldValue {
                key,
                value,
                occurrence,
                ..
            } => fields::set_field_value(text, path, key, value, *occurrence)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::RemoveField { key, line, .. } => {
                fields::remove_field(text, path, key, *line).map(|(c, _)| Edit::new(c))
            }
            Mutation::CreateTask { task, position, .. } => {
                tasks::create_task(text, path, task, position, &config.tasks)
                    .map(|(c, line)| Edit::new(c).at_line(line))
            }
            Mutation::ToggleTask {
                line, done_date, ..
            } => tasks::toggle_task(text, path, *line, *done_date, &config.tasks).map(
                |(c, completed)| Edit {
                    completed: Some(completed),
                    ..Edit::new(c).at_line(*line)
                },
            ),
            Mutation::UpdateTask { line, update, .. } => {
                tasks::update_task(text, path, *line, update, &config.tasks)
                    .map(|c| Edit::new(c).at_line(*line))
            }
            Mutation::AddCard {
                column,
                card,
                position,
                ..
            } => board::add_card(text, path, column, card, *position)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::MoveCard {
                from_column,
                card,
                to_column,
                position,
                ..
            } => board::move_card(text, path, from_column, card, to_column, *position)
                .map(|(c, line)| Edit::new(c).at_line(line)),
            Mutation::ToggleCard { column, card, .. } => board::toggle_card(text, path, column, card)
                .map(|(c, completed)| Edit {
                    completed: Some(completed),
                    ..Edit::new(c)
                }),
            Mutation::AddNode { node, .. } => canvas::add_node(text, path, node).map(|(c, id)| Edit {
                created_id: Some(id),
                ..Edit::new(c)
            }),
            Mutation::AddEdge { edge, .. } => canvas::add_edge(text, path, edge).map(|(c, id)| Edit {
                created_id: Some(id),
                ..Edit::new(c)
            }),
            Mutation::RemoveNode {
                node_id, cascade, ..
            } => canvas::remove_node(text, path, node_id, *cascade).map(|(c, removed)| Edit {
                removed_edges: removed,
                ..Edit::new(c)
            }),
            Mutation::RemoveEdge { edge_id, .. } => {
                canvas::remove_edge(text, path, edge_id).map(Edit::new)
            }
        })?;

        tracing::debug!(
            op = mutation.name(),
            path = %outcome.path.display(),
            changed = outcome.changed,
            "applied mutation"
        );
        Ok(outcome)
    }

    fn edit(
        &self,
        relative: &Path,
        transform: impl FnOnce(&str, &Path) -> Result<Edit>,
    ) -> Result<MutationOutcome> {
        let note = self.vault.load_note(relative)?;
        let edit = transform(&note.content, relative)?;
        let changed = edit.content != note.content;

        if changed {
            atomic_write(&self.vault.note_path(relative), &edit.content)?;
        }

        Ok(MutationOutcome {
            path: relative.to_path_buf(),
            changed,
            line: edit.line,
            created_id: edit.created_id,
            removed_edges: edit.removed_edges,
            completed: edit.completed,
        })
    }
}

/// Write a file through a temp file in the same directory and an atomic rename.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| VaultError::NoteNotFound(path.to_path_buf()))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| VaultError::AtomicWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|e| VaultError::AtomicWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    // the temp file is created 0600; the note keeps its own mode
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| VaultError::AtomicWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
    temp.persist(path).map_err(|e| VaultError::AtomicWrite {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Line-level helpers shared by the edit modules. Lines are 1-indexed.

/// Byte range of each line, terminator included.
pub(crate) fn line_spans(content: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        spans.push(offset..offset + line.len());
        offset += line.len();
    }
    spans
}

/// The line terminator the content already uses.
pub(crate) fn eol(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

fn terminator(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Insert `block` (no trailing newline) as whole lines before line `at`.
/// `at` one past the last line appends.
pub(crate) fn insert_before_line(content: &str, at: usize, block: &str) -> String {
    let spans = line_spans(content);
    let nl = eol(content);
    let block = block.replace("\r\n", "\n").replace('\n', nl);

    if at >= 1 && at <= spans.len() {
        let offset = spans[at - 1].start;
        format!("{}{}{}{}", &content[..offset], block, nl, &content[offset..])
    } else if content.is_empty() {
        format!("{}{}", block, nl)
    } else if content.ends_with('\n') {
        format!("{}{}{}", content, block, nl)
    } else {
        format!("{}{}{}", content, nl, block)
    }
}

/// Remove lines `start..end` (end exclusive).
pub(crate) fn remove_lines(content: &str, start: usize, end: usize) -> String {
    let spans = line_spans(content);
    if start == 0 || start >= end || end - 1 > spans.len() {
        return content.to_string();
    }
    let mut from = spans[start - 1].start;
    let to = spans[end - 2].end;

    // last line without a terminator: take the newline before it instead
    if to == content.len() && terminator(&content[spans[end - 2].clone()]).is_empty() && from > 0 {
        from -= terminator(&content[..from]).len().max(1);
    }
    format!("{}{}", &content[..from], &content[to..])
}

/// Replace the text of one line, keeping its terminator.
pub(crate) fn replace_line(content: &str, line: usize, text: &str) -> String {
    let spans = line_spans(content);
    let Some(span) = line.checked_sub(1).and_then(|i| spans.get(i)) else {
        return content.to_string();
    };
    let term = terminator(&content[span.clone()]);
    format!("{}{}{}{}", &content[..span.start], text, term, &content[span.end..])
}

/// Text of one line without its terminator.
pub(crate) fn line_text(content: &str, line: usize) -> Option<&str> {
    line.checked_sub(1)
        .and_then(|i| content.split_inclusive('\n').nth(i))
        .map(|l| l.trim_end_matches(['\n', '\r']))
}

/// Text of lines `start..end` (end exclusive), terminators between them kept,
/// the final one dropped.
pub(crate) fn lines_text(content: &str, start: usize, end: usize) -> String {
    let spans = line_spans(content);
    if start == 0 || start >= end || end - 1 > spans.len() {
        return String::new();
    }
    let text = &content[spans[start - 1].start..spans[end - 2].end];
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_insert_before_line() {
        assert_eq!(insert_before_line("a\nb\n", 2, "x"), "a\nx\nb\n");
        assert_eq!(insert_before_line("a\nb\n", 3, "x"), "a\nb\nx\n");
        assert_eq!(insert_before_line("a\nb", 3, "x"), "a\nb\nx");
        assert_eq!(insert_before_line("", 1, "x"), "x\n");
        assert_eq!(insert_before_line("a\r\nb\r\n", 2, "x\ny"), "a\r\nx\r\ny\r\nb\r\n");
    }

    #[test]
    fn test_remove_lines() {
        assert_eq!(remove_lines("a\nb\nc\n", 2, 3), "a\nc\n");
        assert_eq!(remove_lines("a\nb\nc\n", 3, 4), "a\nb\n");
        assert_eq!(remove_lines("a\nb\nc", 3, 4), "a\nb");
        assert_eq!(remove_lines("a\nb\nc", 2, 4), "a");
        assert_eq!(remove_lines("only", 1, 2), "");
    }

    #[test]
    fn test_insert_then_remove_restores() {
        for original in ["a\nb", "a\nb\n", ""] {
            let count = original.split_inclusive('\n').count();
            let inserted = insert_before_line(original, count + 1, "#tag");
            assert_eq!(remove_lines(&inserted, count + 1, count + 2), original);
        }
    }

    #[test]
    fn test_replace_and_read_lines() {
        assert_eq!(replace_line("a\r\nb\r\n", 1, "z"), "z\r\nb\r\n");
        assert_eq!(line_text("a\r\nb", 2), Some("b"));
        assert_eq!(lines_text("a\nb\nc\n", 1, 3), "a\nb");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("n.md");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // no stray temp files left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shared.md");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        atomic_write(&path, "new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_failed_edit_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("n.md"), "# Title\n").unwrap();
        let vault = Vault::new(temp.path(), Config::default()).unwrap();
        let result = Mutator::new(&vault).apply(&Mutation::InsertAfterHeading {
            path: PathBuf::from("n.md"),
            heading: "Missing".into(),
            content: "x".into(),
            policy: MatchPolicy::First,
        });
        assert!(matches!(result, Err(VaultError::HeadingNotFound { .. })));
        assert_eq!(fs::read_to_string(temp.path().join("n.md")).unwrap(), "# Title\n");
    }

    #[test]
    fn test_noop_is_not_written() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("n.md"), "text\n").unwrap();
        let vault = Vault::new(temp.path(), Config::default()).unwrap();
        let outcome = Mutator::new(&vault)
            .apply(&Mutation::RemoveTag {
                path: PathBuf::from("n.md"),
                tag: "absent".into(),
            })
            .unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_missing_note_is_not_found() {
        let temp = TempDir::new().unwrap();
        let vault = Vault::new(temp.path(), Config::default()).unwrap();
        let result = Mutator::new(&vault).apply(&Mutation::Append {
            path: PathBuf::from("ghost.md"),
            content: "x".into(),
        });
        assert!(matches!(result, Err(VaultError::NoteNotFound(_))));
    }

    #[test]
    fn test_mutation_from_json() {
        let m: Mutation = serde_json::from_str(
            r#"{"op":"set-header-field","path":"a.md","key":"status","value":"active"}"#,
        )
        .unwrap();
        assert_eq!(m.path(), Path::new("a.md"));
    }
}
