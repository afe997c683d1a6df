//! Diagram inspection command.

use crate::cli::args::CanvasArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::parser::canvas::{Diagram, NodeKind};
use crate::vault::Vault;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct NodeSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Text, file, url or group label, whichever the node carries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeSummary {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CanvasOutput {
    pub path: PathBuf,
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<EdgeSummary>,
}

pub fn summarize(path: PathBuf, diagram: &Diagram) -> CanvasOutput {
    let nodes = diagram
        .nodes
        .iter()
        .map(|node| NodeSummary {
            id: node.id.clone(),
            kind: node.kind.type_name().to_string(),
            content: match &node.kind {
                NodeKind::Text { text } => Some(text.clone()),
                NodeKind::File { file, .. } => Some(file.clone()),
                NodeKind::Link { url } => Some(url.clone()),
                NodeKind::Group { label } => label.clone(),
                NodeKind::Other { .. } => None,
            },
        })
        .collect();
    let edges = diagram
        .edges
        .iter()
        .map(|edge| EdgeSummary {
            id: edge.id.clone(),
            from: edge.from_node.clone(),
            to: edge.to_node.clone(),
            label: edge.label.clone(),
        })
        .collect();
    CanvasOutput { path, nodes, edges }
}

pub fn run(vault: &Vault, args: &CanvasArgs, output: &Output) -> Result<()> {
    let path = vault.resolve_diagram(&args.diagram)?;
    let diagram = vault.load_diagram(&path)?;
    if args.raw {
        output.print(&diagram.to_value())
    } else {
        output.print(&summarize(path, &diagram))
    }
}
