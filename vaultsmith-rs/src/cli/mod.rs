//! CLI command implementations.

pub mod args;
pub mod output;

pub mod board;
pub mod canvas;
pub mod content;
pub mod fields;
pub mod links;
pub mod list;
pub mod stats;
pub mod tags;
pub mod tasks;

pub use args::{Cli, Commands};
pub use output::Output;

use crate::error::Result;
use crate::vault::Vault;

/// Run one parsed command against a vault.
pub fn dispatch(vault: &Vault, command: &Commands, output: &Output) -> Result<()> {
    match command {
        Commands::List(args) => list::run(vault, args, output),
        Commands::Tags(args) => tags::run(vault, args, output),
        Commands::Links(args) => links::links(vault, &args.note, output),
        Commands::Backlinks(args) => links::backlinks(vault, &args.note, output),
        Commands::BrokenLinks(args) => links::broken_links(vault, args, output),
        Commands::Orphans => links::orphans(vault, output),
        Commands::Hubs(args) => links::hubs(vault, args, output),
        Commands::Connections(args) => links::connections(vault, args, output),
        Commands::LinkHealth => links::link_health(vault, output),
        Commands::Stats(args) => stats::run(vault, args, output),
        Commands::Tasks(args) => tasks::tasks(vault, args, output),
        Commands::Fields(args) => fields::run(vault, args, output),
        Commands::Board(args) => board::show(vault, args, output),
        Commands::Canvas(args) => canvas::run(vault, args, output),
        Commands::SetField(args) => content::set_field(vault, args, output),
        Commands::AddTag(args) => content::add_tag(vault, args, output),
        Commands::RemoveTag(args) => content::remove_tag(vault, args, output),
        Commands::InsertAfterHeading(args) => content::insert_after_heading(vault, args, output),
        Commands::InsertAfterBlock(args) => content::insert_after_block(vault, args, output),
        Commands::Append(args) => content::append(vault, args, output),
        Commands::MoveCard(args) => board::move_card(vault, args, output),
        Commands::ToggleTask(args) => tasks::toggle_task(vault, args, output),
        Commands::Apply(args) => content::apply_json(vault, args, output),
    }
}
