//! The document model: a note's exact bytes plus header, body and anchors.

use crate::config::TaskGlyphs;
use crate::error::{Result, VaultError};
use crate::parser::{
    self, board::Board, frontmatter::FrontmatterSplit, parse_block_ids, parse_headings,
    parse_inline_fields, parse_inline_tags, parse_links, parse_tasks, split_frontmatter,
};
use crate::types::{BlockId, Heading, InlineField, Link, Tag, Task};
use serde_yaml::Mapping;
use std::fmt;
use std::path::{Path, PathBuf};

/// A note read from the vault.
///
/// The raw content is kept verbatim; every view (header, body, links, ...)
/// is derived from it on demand, so `to_string()` reproduces the file exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Path relative to vault root (e.g., "proj/My Project.md").
    pub path: PathBuf,

    /// Raw content of the note.
    pub content: String,
}

impl Note {
    pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read a note from disk.
    pub fn load(vault_root: &Path, relative_path: &Path) -> Result<Self> {
        let full_path = vault_root.join(relative_path);
        let content = std::fs::read_to_string(&full_path)
            .map_err(|e| VaultError::from_io(relative_path, e))?;
        Ok(Self::parse(relative_path, content))
    }

    /// The note name (file name without extension).
    pub fn name(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
    }

    fn split(&self) -> FrontmatterSplit<'_> {
        split_frontmatter(&self.content)
    }

    pub fn has_header(&self) -> bool {
        self.split().yaml.is_some()
    }

    /// The raw header YAML, without delimiters.
    pub fn header_raw(&self) -> Option<&str> {
        self.split().yaml
    }

    /// The parsed header, in file key order. Malformed YAML is an error; the
    /// body stays readable through [`Note::body`].
    pub fn header(&self) -> Result<Option<Mapping>> {
        parser::parse_frontmatter(&self.content, &self.path)
    }

    /// The content after the header block.
    pub fn body(&self) -> &str {
        self.split().body
    }

    /// Byte offset where the body starts.
    pub fn body_offset(&self) -> usize {
        self.split().body_offset
    }

    /// Line number where the body starts (1-indexed).
    pub fn body_start_line(&self) -> usize {
        self.split().body_start_line
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    /// A line by number (1-indexed), without its line ending.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1).and_then(|idx| self.content.lines().nth(idx))
    }

    /// Byte offset where a line starts (1-indexed). One past the last line maps to the end.
    pub fn offset_of_line(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        let mut offset = 0;
        for (idx, raw) in self.content.split_inclusive('\n').enumerate() {
            if idx + 1 == line {
                return Some(offset);
            }
            offset += raw.len();
        }
        (line == self.content.split_inclusive('\n').count() + 1).then_some(self.content.len())
    }

    /// The line containing a byte offset (1-indexed).
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.content.len());
        while !self.content.is_char_boundary(offset) {
            offset -= 1;
        }
        self.content[..offset].matches('\n').count() + 1
    }

    fn body_line_shift(&self) -> usize {
        self.body_start_line() - 1
    }

    /// All links and embeds in the body.
    pub fn links(&self) -> Vec<Link> {
        let shift = self.body_line_shift();
        let mut links = parse_links(self.body());
        for link in &mut links {
            link.line += shift;
        }
        links
    }

    /// Header tags followed by inline tags, duplicates included.
    ///
    /// A malformed header contributes no tags.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = match self.header() {
            Ok(Some(header)) => parser::header_tags(&header),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring header tags");
                Vec::new()
            }
        };

        let shift = self.body_line_shift();
        tags.extend(parse_inline_tags(self.body()).into_iter().map(|mut tag| {
            tag.line = tag.line.map(|l| l + shift);
            tag
        }));
        tags
    }

    /// The note's tag set: exact-name dedupe, first occurrence kept.
    pub fn tag_set(&self) -> Vec<Tag> {
        parser::dedupe_tags(self.tags())
    }

    pub fn headings(&self) -> Vec<Heading> {
        let shift = self.body_line_shift();
        let mut headings = parse_headings(self.body());
        for heading in &mut headings {
            heading.line += shift;
        }
        headings
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        let shift = self.body_line_shift();
        let mut ids = parse_block_ids(self.body());
        for id in &mut ids {
            id.line += shift;
        }
        ids
    }

    pub fn inline_fields(&self) -> Vec<InlineField> {
        let shift = self.body_line_shift();
        let mut fields = parse_inline_fields(self.body());
        for field in &mut fields {
            field.line += shift;
        }
        fields
    }

    /// First inline field with the given key (compared canonically).
    pub fn inline_field(&self, key: &str) -> Option<InlineField> {
        let wanted = parser::canonical_key(key);
        self.inline_fields()
            .into_iter()
            .find(|f| f.canonical_key == wanted)
    }

    pub fn tasks(&self, glyphs: &TaskGlyphs) -> Vec<Task> {
        let shift = self.body_line_shift();
        let mut tasks = parse_tasks(self.body(), &self.path, glyphs);
        for task in &mut tasks {
            task.location.line += shift;
        }
        tasks
    }

    /// Whether the header marks this note as a kanban board.
    pub fn is_board(&self) -> bool {
        matches!(self.header(), Ok(Some(ref h)) if parser::board::is_board(h))
    }

    /// The note's board structure. Line numbers are absolute.
    pub fn board(&self) -> Board {
        parser::parse_board(&self.content)
    }

    /// The first heading with exactly this text.
    pub fn heading_anchor(&self, text: &str) -> Option<Heading> {
        self.headings().into_iter().find(|h| h.text == text)
    }

    /// Every heading with exactly this text, in document order.
    pub fn headings_named(&self, text: &str) -> Vec<Heading> {
        self.headings()
            .into_iter()
            .filter(|h| h.text == text)
            .collect()
    }

    /// The first block carrying `^id`. A leading `^` in `id` is ignored.
    pub fn block_anchor(&self, id: &str) -> Option<BlockId> {
        let id = id.trim_start_matches('^');
        self.block_ids().into_iter().find(|b| b.id == id)
    }

    pub fn blocks_named(&self, id: &str) -> Vec<BlockId> {
        let id = id.trim_start_matches('^');
        self.block_ids().into_iter().filter(|b| b.id == id).collect()
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
