//! vaultsmith: parse, analyze and surgically edit Obsidian-style vaults.
//!
//! # Overview
//!
//! A vault is a directory of markdown notes (plus `.canvas` diagrams).
//! vaultsmith reads it fresh on every request and offers:
//! - A lossless note model with header, tags, links, headings, block ids,
//!   inline fields, tasks and kanban boards
//! - Format-preserving mutations written atomically
//! - A link graph with backlinks, broken links, orphans, hubs and
//!   breadth-first connections
//! - Per-note, vault, task and board statistics
//! - Read-only queries over tags, inline fields and tasks
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vaultsmith::{Config, Vault};
//! use vaultsmith::graph::LinkGraph;
//!
//! let vault = Vault::new("/path/to/vault", Config::default()).unwrap();
//! for path in vault.list_notes().unwrap() {
//!     println!("{}", path.display());
//! }
//!
//! let graph = LinkGraph::build(&vault).unwrap();
//! for edge in graph.backlinks(Path::new("Home.md")) {
//!     println!("{} -> Home (line {})", edge.source.display(), edge.link.line);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod note;
pub mod parser;
pub mod query;
pub mod scan;
pub mod service;
pub mod stats;
pub mod types;
pub mod vault;

// Re-export main types at crate root
pub use config::Config;
pub use error::{Result, VaultError};
pub use mutation::{Mutation, MutationOutcome, Mutator};
pub use note::Note;
pub use types::*;
pub use vault::Vault;
