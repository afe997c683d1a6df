//! CLI argument definitions using clap.

use crate::graph::Direction;
use crate::mutation::Position;
use crate::query::{TaskSort, TaskStatus};
use crate::types::Priority;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vaultsmith")]
#[command(author, version, about = "Inspect and edit Obsidian-style vaults", long_about = None)]
pub struct Cli {
    /// Path to the vault (overrides VAULTSMITH_VAULT and the config default)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List notes in the vault
    List(ListArgs),

    /// Tags of one note, tag counts for the vault, or notes carrying a tag
    Tags(TagsArgs),

    /// Outgoing links of a note, resolved
    Links(NoteArg),

    /// Notes linking to a note
    Backlinks(NoteArg),

    /// Links whose target matches no note
    #[command(name = "broken-links")]
    BrokenLinks(BrokenLinksArgs),

    /// Notes with no resolved links in or out
    Orphans,

    /// Most connected notes
    Hubs(HubsArgs),

    /// Notes reachable from a note within a number of hops
    Connections(ConnectionsArgs),

    /// Link health report for the whole vault
    #[command(name = "link-health")]
    LinkHealth,

    /// Statistics for one note or the whole vault
    Stats(StatsArgs),

    /// Search tasks across the vault
    Tasks(TasksArgs),

    /// Search inline fields across the vault
    Fields(FieldsArgs),

    /// Show a kanban board
    Board(BoardArgs),

    /// Show a diagram file
    Canvas(CanvasArgs),

    /// Set a header (frontmatter) field
    #[command(name = "set-field")]
    SetField(SetFieldArgs),

    /// Add a tag to a note
    #[command(name = "add-tag")]
    AddTag(TagEditArgs),

    /// Remove a tag from a note
    #[command(name = "remove-tag")]
    RemoveTag(TagEditArgs),

    /// Insert text below a heading
    #[command(name = "insert-after-heading")]
    InsertAfterHeading(InsertAfterHeadingArgs),

    /// Insert text below a block id
    #[command(name = "insert-after-block")]
    InsertAfterBlock(InsertAfterBlockArgs),

    /// Append text to the end of a note
    Append(AppendArgs),

    /// Move a kanban card to another column
    #[command(name = "move-card")]
    MoveCard(MoveCardArgs),

    /// Toggle a task's completion
    #[command(name = "toggle-task")]
    ToggleTask(ToggleTaskArgs),

    /// Apply a mutation given as JSON
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct NoteArg {
    /// Note path or name
    pub note: String,
}

// === Reading ===

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only notes whose path matches this glob
    #[arg(long)]
    pub glob: Option<String>,

    /// Only notes carrying this tag (repeatable, all must match)
    #[arg(long)]
    pub tag: Vec<String>,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Note to list tags for; the whole vault when absent
    pub note: Option<String>,

    /// List the notes carrying this tag (nested tags included)
    #[arg(long, conflicts_with = "note")]
    pub find: Option<String>,
}

#[derive(Args, Debug)]
pub struct BrokenLinksArgs {
    /// Group by missing target instead of listing every link
    #[arg(long)]
    pub stubs: bool,
}

#[derive(Args, Debug)]
pub struct HubsArgs {
    /// Keep every note whose degree exceeds this value
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Number of hubs when no threshold is given
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Args, Debug)]
pub struct ConnectionsArgs {
    /// Note path or name
    pub note: String,

    /// Maximum number of hops
    #[arg(long, default_value_t = 2)]
    pub depth: usize,

    #[arg(long, value_enum, default_value = "both")]
    pub direction: DirectionArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Outgoing,
    Incoming,
    Both,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Outgoing => Direction::Outgoing,
            DirectionArg::Incoming => Direction::Incoming,
            DirectionArg::Both => Direction::Both,
        }
    }
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Note path or name; the whole vault when absent
    pub note: Option<String>,

    /// Include per-note rows in vault statistics
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    #[arg(long, value_enum, default_value = "all")]
    pub status: StatusArg,

    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Due before this date (YYYY-MM-DD, today, +3d, ...)
    #[arg(long)]
    pub due_before: Option<String>,

    #[arg(long)]
    pub due_after: Option<String>,

    /// Due between today and N days from now
    #[arg(long)]
    pub due_within: Option<i64>,

    #[arg(long)]
    pub scheduled_before: Option<String>,

    #[arg(long)]
    pub scheduled_after: Option<String>,

    #[arg(long)]
    pub scheduled_within: Option<i64>,

    /// Only recurring tasks
    #[arg(long, conflicts_with = "no_recurrence")]
    pub recurring: bool,

    /// Only non-recurring tasks
    #[arg(long)]
    pub no_recurrence: bool,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long, value_enum, default_value = "due")]
    pub sort: SortArg,

    /// Reverse the sort order
    #[arg(long)]
    pub desc: bool,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Print task statistics instead of tasks
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Open,
    Completed,
    All,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => TaskStatus::Open,
            StatusArg::Completed => TaskStatus::Completed,
            StatusArg::All => TaskStatus::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Highest,
    High,
    Normal,
    Low,
    Lowest,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Highest => Priority::Highest,
            PriorityArg::High => Priority::High,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::Low => Priority::Low,
            PriorityArg::Lowest => Priority::Lowest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Due,
    Priority,
    File,
    Line,
}

impl From<SortArg> for TaskSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Due => TaskSort::Due,
            SortArg::Priority => TaskSort::Priority,
            SortArg::File => TaskSort::File,
            SortArg::Line => TaskSort::Line,
        }
    }
}

#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Field key (matched case-insensitively, emphasis ignored)
    pub key: String,

    /// Only fields with this value
    #[arg(long)]
    pub value: Option<String>,
}

#[derive(Args, Debug)]
pub struct BoardArgs {
    /// Board note path or name
    pub note: String,

    /// Print card statistics instead of the board
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct CanvasArgs {
    /// Diagram path or name
    pub diagram: String,

    /// Print the full normalized JSON
    #[arg(long)]
    pub raw: bool,
}

// === Editing ===

#[derive(Args, Debug)]
pub struct SetFieldArgs {
    pub note: String,

    pub key: String,

    /// Value, parsed as YAML (plain text stays a string)
    pub value: String,
}

#[derive(Args, Debug)]
pub struct TagEditArgs {
    pub note: String,

    /// Tag name, with or without `#`
    pub tag: String,
}

#[derive(Args, Debug)]
pub struct InsertAfterHeadingArgs {
    pub note: String,

    /// Heading text, without the `#` markers
    pub heading: String,

    pub content: String,

    /// Fail if the heading appears more than once
    #[arg(long)]
    pub unique: bool,
}

#[derive(Args, Debug)]
pub struct InsertAfterBlockArgs {
    pub note: String,

    /// Block id, with or without `^`
    pub block: String,

    pub content: String,

    /// Fail if the block id appears more than once
    #[arg(long)]
    pub unique: bool,
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    pub note: String,

    pub content: String,
}

#[derive(Args, Debug)]
pub struct MoveCardArgs {
    /// Board note path or name
    pub note: String,

    /// Card text or title
    pub card: String,

    #[arg(long)]
    pub from: String,

    #[arg(long)]
    pub to: String,

    /// start, end, or a 0-based index
    #[arg(long, default_value = "end", value_parser = parse_position)]
    pub position: Position,
}

fn parse_position(s: &str) -> Result<Position, String> {
    match s.to_lowercase().as_str() {
        "start" => Ok(Position::Start),
        "end" => Ok(Position::End),
        other => other
            .parse::<usize>()
            .map(Position::Index)
            .map_err(|_| format!("expected start, end or an index, got '{}'", s)),
    }
}

#[derive(Args, Debug)]
pub struct ToggleTaskArgs {
    pub note: String,

    /// Line of the task (1-indexed)
    pub line: usize,

    /// Done date to stamp when completing (YYYY-MM-DD, today, ...)
    #[arg(long)]
    pub done_date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Mutation as JSON, e.g. '{"op":"append","path":"a.md","content":"x"}'
    pub mutation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_card() {
        let cli = Cli::parse_from([
            "vaultsmith", "move-card", "Board", "Fix bug", "--from", "Todo", "--to", "Done",
            "--position", "0",
        ]);
        match cli.command {
            Commands::MoveCard(args) => {
                assert_eq!(args.position, Position::Index(0));
                assert_eq!(args.to, "Done");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_format() {
        let cli = Cli::parse_from(["vaultsmith", "orphans", "--format", "yaml"]);
        assert_eq!(cli.format, OutputFormat::Yaml);
    }
}
