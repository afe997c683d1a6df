//! Kanban board commands.

use crate::cli::args::{BoardArgs, MoveCardArgs};
use crate::cli::output::Output;
use crate::error::Result;
use crate::mutation::{Mutation, Mutator};
use crate::parser::{Board, BoardStats};
use crate::vault::Vault;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct BoardOutput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub board: Board,
}

#[derive(Debug, Serialize)]
pub struct BoardStatsOutput {
    pub path: PathBuf,
    #[serde(flatten)]
    pub stats: BoardStats,
}

pub fn show(vault: &Vault, args: &BoardArgs, output: &Output) -> Result<()> {
    let path = vault.resolve_note(&args.note)?;
    let note = vault.load_note(&path)?;
    if !note.is_board() {
        output.info(&format!("{} has no kanban header; reading it as a board anyway", path.display()));
    }
    let board = note.board();
    if args.stats {
        let stats = board.statistics(&vault.config.board);
        output.print(&BoardStatsOutput { path, stats })
    } else {
        output.print(&BoardOutput { path, board })
    }
}

pub fn move_card(vault: &Vault, args: &MoveCardArgs, output: &Output) -> Result<()> {
    let path = vault.resolve_note(&args.note)?;
    let outcome = Mutator::new(vault).apply(&Mutation::MoveCard {
        path,
        from_column: args.from.clone(),
        card: args.card.clone(),
        to_column: args.to.clone(),
        position: args.position,
    })?;
    output.print(&outcome)
}
