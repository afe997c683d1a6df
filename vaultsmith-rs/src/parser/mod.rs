//! Parsers for the markdown dialects layered on vault notes.

pub mod block_id;
pub mod board;
pub mod canvas;
pub mod code_block;
pub mod frontmatter;
pub mod heading;
pub mod inline_field;
pub mod link;
pub mod tag;
pub mod task;

pub use block_id::parse_block_ids;
pub use board::{Board, BoardStats, Card, Column, parse_board};
pub use canvas::{Diagram, DiagramEdge, DiagramNode, NodeKind, Side};
pub use code_block::{CodeRange, find_code_ranges};
pub use frontmatter::{parse_frontmatter, split_frontmatter};
pub use heading::{parse_headings, slugify};
pub use inline_field::{canonical_key, format_field, parse_inline_fields};
pub use link::{is_attachment, parse_links};
pub use tag::{dedupe_tags, header_tags, parse_inline_tags};
pub use task::{format_task_line, parse_date_arg, parse_tasks};
