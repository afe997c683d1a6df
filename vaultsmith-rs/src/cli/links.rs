//! Link graph CLI commands.

use crate::cli::args::{BrokenLinksArgs, ConnectionsArgs, HubsArgs};
use crate::cli::output::Output;
use crate::error::Result;
use crate::graph::{BrokenLink, Connectivity, Edge, HubEntry, Hop, LinkGraph, Stub};
use crate::vault::Vault;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct LinksOutput<'g> {
    pub path: PathBuf,
    pub resolved: Vec<&'g Edge>,
    pub broken: Vec<&'g BrokenLink>,
}

#[derive(Debug, Serialize)]
pub struct BacklinksOutput<'g> {
    pub path: PathBuf,
    pub backlinks: Vec<&'g Edge>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct BrokenLinksOutput<'g> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<&'g BrokenLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stubs: Vec<Stub>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct OrphansOutput<'g> {
    pub orphans: Vec<&'g PathBuf>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HubsOutput {
    pub hubs: Vec<HubEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionsOutput {
    pub path: PathBuf,
    pub depth: usize,
    pub hops: Vec<Hop>,
}

// Build the graph and report anything it had to skip.
fn graph(vault: &Vault, output: &Output) -> Result<LinkGraph> {
    let graph = LinkGraph::build(vault)?;
    output.warnings(graph.skipped());
    Ok(graph)
}

pub fn links(vault: &Vault, note: &str, output: &Output) -> Result<()> {
    let path = vault.resolve_note(note)?;
    let graph = graph(vault, output)?;
    let broken = graph
        .broken_links()
        .into_iter()
        .filter(|b| b.source == path)
        .collect();
    output.print(&LinksOutput {
        resolved: graph.outgoing(&path),
        broken,
        path,
    })
}

pub fn backlinks(vault: &Vault, note: &str, output: &Output) -> Result<()> {
    let path = vault.resolve_note(note)?;
    let graph = graph(vault, output)?;
    let backlinks = graph.backlinks(&path);
    output.print(&BacklinksOutput {
        total: backlinks.len(),
        backlinks,
        path,
    })
}

pub fn broken_links(vault: &Vault, args: &BrokenLinksArgs, output: &Output) -> Result<()> {
    let graph = graph(vault, output)?;
    let links = graph.broken_links();
    let total = links.len();
    let response = if args.stubs {
        BrokenLinksOutput {
            links: Vec::new(),
            stubs: graph.stubs(),
            total,
        }
    } else {
        BrokenLinksOutput {
            links,
            stubs: Vec::new(),
            total,
        }
    };
    output.print(&response)
}

pub fn orphans(vault: &Vault, output: &Output) -> Result<()> {
    let graph = graph(vault, output)?;
    let orphans = graph.orphans();
    output.print(&OrphansOutput {
        total: orphans.len(),
        orphans,
    })
}

pub fn hubs(vault: &Vault, args: &HubsArgs, output: &Output) -> Result<()> {
    let graph = graph(vault, output)?;
    output.print(&HubsOutput {
        hubs: graph.hubs(args.threshold, args.top),
    })
}

pub fn connections(vault: &Vault, args: &ConnectionsArgs, output: &Output) -> Result<()> {
    let path = vault.resolve_note(&args.note)?;
    let graph = graph(vault, output)?;
    let hops = graph.connections(&path, args.depth, args.direction.into());
    output.print(&ConnectionsOutput {
        path,
        depth: args.depth,
        hops,
    })
}

pub fn link_health(vault: &Vault, output: &Output) -> Result<()> {
    let report: Connectivity = graph(vault, output)?.connectivity();
    output.print(&report)
}
