//! Statistics command.

use crate::cli::args::StatsArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::stats::{VaultStats, note_stats};
use crate::vault::Vault;

pub fn run(vault: &Vault, args: &StatsArgs, output: &Output) -> Result<()> {
    if let Some(note) = &args.note {
        let path = vault.resolve_note(note)?;
        return output.print(&note_stats(vault, &path)?);
    }

    let mut stats = VaultStats::collect(vault)?;
    output.warnings(&stats.skipped);
    if !args.detailed {
        stats.per_note.clear();
    }
    output.print(&stats)
}
