//! Tag-related CLI commands.

use crate::cli::args::TagsArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::query::{TaggedNote, find_notes_by_tag, for_each_note};
use crate::types::Tag;
use crate::vault::Vault;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct NoteTagsOutput {
    pub path: PathBuf,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub struct VaultTagOutput {
    pub tag: String,
    /// Notes carrying the tag.
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct VaultTagsOutput {
    pub tags: Vec<VaultTagOutput>,
}

#[derive(Debug, Serialize)]
pub struct TaggedNotesOutput {
    pub tag: String,
    pub notes: Vec<TaggedNote>,
}

pub fn run(vault: &Vault, args: &TagsArgs, output: &Output) -> Result<()> {
    if let Some(tag) = &args.find {
        let found = find_notes_by_tag(vault, tag)?;
        output.warnings(&found.skipped);
        return output.print(&TaggedNotesOutput {
            tag: tag.trim_start_matches('#').to_string(),
            notes: found.notes,
        });
    }

    match &args.note {
        Some(query) => {
            let path = vault.resolve_note(query)?;
            let note = vault.load_note(&path)?;
            output.print(&NoteTagsOutput {
                tags: note.tag_set(),
                path,
            })
        }
        None => {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            let skipped = for_each_note(vault, |note| {
                for tag in note.tag_set() {
                    *counts.entry(tag.name).or_default() += 1;
                }
            })?;
            output.warnings(&skipped);
            let mut tags: Vec<VaultTagOutput> = counts
                .into_iter()
                .map(|(tag, count)| VaultTagOutput { tag, count })
                .collect();
            tags.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
            output.print(&VaultTagsOutput { tags })
        }
    }
}
