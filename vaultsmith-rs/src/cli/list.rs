//! List command implementation.

use crate::cli::args::ListArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::query::tag_matches;
use crate::vault::Vault;
use glob::Pattern;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub notes: Vec<PathBuf>,
    pub total: usize,
}

pub fn run(vault: &Vault, args: &ListArgs, output: &Output) -> Result<()> {
    let pattern = args.glob.as_deref().map(Pattern::new).transpose()?;
    let mut notes: Vec<PathBuf> = vault
        .list_notes()?
        .into_iter()
        .filter(|path| pattern.as_ref().is_none_or(|p| p.matches_path(path)))
        .collect();

    if !args.tag.is_empty() {
        notes.retain(|path| match vault.load_note(path) {
            Ok(note) => {
                let names: Vec<String> = note.tag_set().into_iter().map(|t| t.name).collect();
                args.tag.iter().all(|wanted| {
                    names
                        .iter()
                        .any(|name| tag_matches(&vault.config.tags, name, wanted))
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable note");
                false
            }
        });
    }

    let total = notes.len();
    if let Some(limit) = args.limit {
        notes.truncate(limit);
    }
    output.print(&ListResponse { notes, total })
}
