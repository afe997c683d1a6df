//! Diagram node and edge edits.
//!
//! A diagram is parsed, edited, validated and serialized whole; unknown
//! fields ride along in the parsed model.

use crate::error::Result;
use crate::parser::canvas::{Diagram, DiagramEdge, DiagramNode, NodeKind, Side};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Content of a node to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSpec {
    Text { text: String },
    File {
        file: String,
        #[serde(default)]
        subpath: Option<String>,
    },
    Link { url: String },
    Group {
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<NodeSpec> for NodeKind {
    fn from(spec: NodeSpec) -> Self {
        match spec {
            NodeSpec::Text { text } => NodeKind::Text { text },
            NodeSpec::File { file, subpath } => NodeKind::File { file, subpath },
            NodeSpec::Link { url } => NodeKind::Link { url },
            NodeSpec::Group { label } => NodeKind::Group { label },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    #[serde(flatten)]
    pub spec: NodeSpec,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub color: Option<String>,
    /// Requested id; a fresh one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
}

fn default_width() -> f64 {
    250.0
}

fn default_height() -> f64 {
    60.0
}

impl NewNode {
    pub fn new(spec: NodeSpec) -> Self {
        Self {
            spec,
            x: 0.0,
            y: 0.0,
            width: default_width(),
            height: default_height(),
            color: None,
            id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewEdge {
    pub from: String,
    pub to: String,
    pub from_side: Option<Side>,
    pub to_side: Option<Side>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub id: Option<String>,
}

fn finish(diagram: &Diagram, path: &Path) -> Result<String> {
    diagram.validate(path)?;
    diagram.to_json_string()
}

/// Add a node. Returns the new text and the node id.
pub fn add_node(text: &str, path: &Path, node: &NewNode) -> Result<(String, String)> {
    let mut diagram = Diagram::parse(text, path)?;
    let mut new = DiagramNode::new(node.spec.clone().into(), node.x, node.y, node.width, node.height);
    new.color = node.color.clone();
    let id = diagram.add_node(new, node.id.clone())?;
    Ok((finish(&diagram, path)?, id))
}

/// Add an edge between existing nodes. Returns the new text and the edge id.
pub fn add_edge(text: &str, path: &Path, edge: &NewEdge) -> Result<(String, String)> {
    let mut diagram = Diagram::parse(text, path)?;
    let mut new = DiagramEdge::new(edge.from.clone(), edge.to.clone());
    new.from_side = edge.from_side;
    new.to_side = edge.to_side;
    new.label = edge.label.clone();
    new.color = edge.color.clone();
    let id = diagram.add_edge(new, edge.id.clone())?;
    Ok((finish(&diagram, path)?, id))
}

/// Remove a node. Returns the new text and the ids of edges removed with it.
pub fn remove_node(text: &str, path: &Path, id: &str, cascade: bool) -> Result<(String, Vec<String>)> {
    let mut diagram = Diagram::parse(text, path)?;
    let removal = diagram.remove_node(id, cascade)?;
    let removed = removal.removed_edges.into_iter().map(|e| e.id).collect();
    Ok((finish(&diagram, path)?, removed))
}

pub fn remove_edge(text: &str, path: &Path, id: &str) -> Result<String> {
    let mut diagram = Diagram::parse(text, path)?;
    diagram.remove_edge(id)?;
    finish(&diagram, path)
}
