//! Shared types for vaultsmith.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Syntax a link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// `[[target#heading|alias]]`
    Wiki,
    /// `[text](path/to/note.md)`
    Markdown,
}

/// A wikilink, markdown link or embed found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The target as written, without any `#heading` / `#^block` suffix.
    pub target: String,

    /// Optional display alias (wikilink `|alias` or markdown link text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Optional heading reference (the part after #, before ^).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Optional block reference (the part after #^).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,

    pub kind: LinkKind,

    /// Whether this is an embed (`![[...]]` or `![](...)`).
    pub embed: bool,

    /// Line number where this link appears (1-indexed).
    pub line: usize,

    /// Start column in the line (byte offset, 0-indexed).
    pub start_col: usize,

    /// End column in the line (exclusive).
    pub end_col: usize,
}

impl Link {
    /// Returns the full link target including heading/block reference.
    pub fn full_target(&self) -> String {
        let mut result = self.target.clone();
        if let Some(ref heading) = self.heading {
            result.push('#');
            result.push_str(heading);
        }
        if let Some(ref block_id) = self.block_id {
            result.push_str("#^");
            result.push_str(block_id);
        }
        result
    }

    /// Returns the display text for this link.
    pub fn display_text(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

/// Where a tag was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrigin {
    /// Listed in the frontmatter `tags` field.
    Header,
    /// A `#tag` marker in the body.
    Inline,
}

/// A tag found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name without the leading `#` (e.g. "project/active").
    pub name: String,

    pub origin: TagOrigin,

    /// Line number for inline tags (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// Byte columns of the `#tag` token on its line, for inline tags.
    #[serde(skip)]
    pub span: Option<(usize, usize)>,
}

impl Tag {
    /// Returns the parent tag if this is a nested tag.
    /// e.g., "tray/autonomy" -> Some("tray")
    pub fn parent(&self) -> Option<&str> {
        self.name.rfind('/').map(|idx| &self.name[..idx])
    }

    /// Returns all ancestor tags.
    /// e.g., "a/b/c" -> ["a", "a/b"]
    pub fn ancestors(&self) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut current = String::new();

        for part in self.name.split('/') {
            if !current.is_empty() {
                ancestors.push(current.clone());
                current.push('/');
            }
            current.push_str(part);
        }

        ancestors
    }
}

/// A block ID found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockId {
    /// The block ID without the ^ prefix.
    pub id: String,

    /// Line number where this block ID appears (1-indexed).
    pub line: usize,

    /// The type of block this ID is attached to.
    pub block_type: BlockType,
}

/// Type of block that a block ID is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Paragraph,
    ListItem,
    Heading,
    Blockquote,
    Table,
}

/// A heading found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// The heading text (without the # prefix).
    pub text: String,

    /// The heading level (1-6).
    pub level: u8,

    /// Line number where this heading appears (1-indexed).
    pub line: usize,

    /// The slug for linking (lowercase, hyphens for spaces).
    pub slug: String,
}

/// The syntax an inline field was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSyntax {
    /// `key:: value` on its own line.
    FullLine,
    /// `[key:: value]`
    Bracket,
    /// `(key:: value)`
    Paren,
}

/// Detected type of an inline field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValueType {
    Text,
    Number,
    Boolean,
    Date,
    Link,
    List,
}

/// An inline `key:: value` field found in a note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineField {
    /// The key as written.
    pub key: String,

    /// Lowercased, emphasis-stripped, hyphenated key used for matching.
    pub canonical_key: String,

    pub value: String,

    pub value_type: FieldValueType,

    pub syntax: FieldSyntax,

    /// Line number (1-indexed).
    pub line: usize,

    /// Start column in the line (0-indexed).
    pub start_col: usize,

    /// End column in the line (exclusive).
    pub end_col: usize,
}

/// Task priority level, ordered lowest to highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Lowest,
    ];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Highest => write!(f, "highest"),
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
            Priority::Lowest => write!(f, "lowest"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest" => Ok(Priority::Highest),
            "high" => Ok(Priority::High),
            "normal" | "medium" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            "lowest" => Ok(Priority::Lowest),
            _ => Err(crate::error::VaultError::InvalidPriority(s.to_string())),
        }
    }
}

/// Location of a task in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLocation {
    /// The file path (relative to vault root).
    pub file: PathBuf,

    /// Line number (1-indexed).
    pub line: usize,
}

/// A checkbox task found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub location: TaskLocation,

    /// The raw task line as it appears in the note.
    pub raw: String,

    /// The character between the brackets (' ', 'x', '/', ...).
    pub symbol: char,

    pub completed: bool,

    /// The task description with metadata tokens removed.
    pub description: String,

    /// Indentation level (tabs or 4 spaces = 1).
    pub indent: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,

    pub priority: Priority,

    /// Recurrence rule text (e.g. "every week"), never expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,

    /// Per-item problems such as an unparseable date.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            origin: TagOrigin::Inline,
            line: Some(1),
            span: None,
        }
    }

    #[test]
    fn test_tag_parent() {
        assert_eq!(tag("tray/autonomy").parent(), Some("tray"));
        assert_eq!(tag("rust").parent(), None);
    }

    #[test]
    fn test_tag_ancestors() {
        assert_eq!(tag("a/b/c").ancestors(), vec!["a", "a/b"]);
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::Highest > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Low > Priority::Lowest);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_link_full_target() {
        let link = Link {
            target: "note".to_string(),
            alias: None,
            heading: Some("section".to_string()),
            block_id: None,
            kind: LinkKind::Wiki,
            embed: false,
            line: 1,
            start_col: 0,
            end_col: 10,
        };
        assert_eq!(link.full_target(), "note#section");
        assert_eq!(link.display_text(), "note");
    }
}
