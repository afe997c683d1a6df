//! Diagram (`.canvas`) files: JSON with `nodes` and `edges` arrays.
//!
//! Fields outside the known schema are kept in `extra` maps so a
//! parse, edit, serialize cycle never drops them.

use crate::error::{Result, VaultError};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::path::Path;

/// Which side of a node an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Side::Top),
            "right" => Some(Side::Right),
            "bottom" => Some(Side::Bottom),
            "left" => Some(Side::Left),
            _ => None,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Side::parse(&s.to_lowercase()).ok_or_else(|| VaultError::InvalidDiagram {
            path: Default::default(),
            message: format!("unknown edge side '{}'", s),
        })
    }
}

/// The typed content of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text { text: String },
    File { file: String, subpath: Option<String> },
    Link { url: String },
    Group { label: Option<String> },
    /// A node type this crate does not model; its fields live in `extra`.
    Other { type_name: String },
}

impl NodeKind {
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Text { .. } => "text",
            NodeKind::File { .. } => "file",
            NodeKind::Link { .. } => "link",
            NodeKind::Group { .. } => "group",
            NodeKind::Other { type_name } => type_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    pub id: String,
    pub kind: NodeKind,
    /// Geometry keeps the number as written (`10.0` stays `10.0`).
    pub x: Number,
    pub y: Number,
    pub width: Number,
    pub height: Number,
    pub color: Option<String>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramEdge {
    pub id: String,
    pub from_node: String,
    pub from_side: Option<Side>,
    pub to_node: String,
    pub to_side: Option<Side>,
    pub label: Option<String>,
    pub color: Option<String>,
    pub extra: Map<String, Value>,
}

/// A parsed diagram file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    /// Top-level keys other than `nodes` and `edges`.
    pub extra: Map<String, Value>,
}

/// Everything removed by a node removal.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRemoval {
    pub node: DiagramNode,
    pub removed_edges: Vec<DiagramEdge>,
}

struct Fields<'a> {
    map: Map<String, Value>,
    path: &'a Path,
    what: String,
}

impl Fields<'_> {
    fn invalid(&self, message: String) -> VaultError {
        VaultError::InvalidDiagram {
            path: self.path.to_path_buf(),
            message: format!("{}: {}", self.what, message),
        }
    }

    fn required_str(&mut self, key: &str) -> Result<String> {
        match self.map.remove(key) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(self.invalid(format!("'{}' must be a string", key))),
            None => Err(self.invalid(format!("missing '{}'", key))),
        }
    }

    fn optional_str(&mut self, key: &str) -> Result<Option<String>> {
        match self.map.remove(key) {
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(self.invalid(format!("'{}' must be a string", key))),
        }
    }

    fn number(&mut self, key: &str) -> Result<Number> {
        match self.map.remove(key) {
            Some(Value::Number(n)) => Ok(n),
            Some(_) => Err(self.invalid(format!("'{}' must be a number", key))),
            None => Err(self.invalid(format!("missing '{}'", key))),
        }
    }

    fn side(&mut self, key: &str) -> Result<Option<Side>> {
        match self.optional_str(key)? {
            Some(s) => Side::parse(&s)
                .map(Some)
                .ok_or_else(|| self.invalid(format!("unknown side '{}'", s))),
            None => Ok(None),
        }
    }
}

// Whole numbers given as `f64` become integers; non-finite values become 0.
fn number_from_f64(n: f64) -> Number {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Number::from(n as i64)
    } else {
        Number::from_f64(n).unwrap_or_else(|| Number::from(0))
    }
}

impl Diagram {
    /// Parse diagram JSON. Missing `nodes`/`edges` arrays read as empty.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let invalid = |message: String| VaultError::InvalidDiagram {
            path: path.to_path_buf(),
            message,
        };

        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut root = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(invalid("top level must be an object".to_string())),
            Err(e) => return Err(invalid(e.to_string())),
        };

        let take_array = |root: &mut Map<String, Value>, key: &str| -> Result<Vec<Value>> {
            match root.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(_) => Err(invalid(format!("'{}' must be an array", key))),
            }
        };
        let raw_nodes = take_array(&mut root, "nodes")?;
        let raw_edges = take_array(&mut root, "edges")?;

        let objects = |items: Vec<Value>, what: &str| -> Result<Vec<Map<String, Value>>> {
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| match v {
                    Value::Object(map) => Ok(map),
                    _ => Err(invalid(format!("{} #{} is not an object", what, i))),
                })
                .collect()
        };

        let nodes = objects(raw_nodes, "node")?
            .into_iter()
            .enumerate()
            .map(|(i, map)| node_from_map(map, path, i))
            .collect::<Result<Vec<_>>>()?;
        let edges = objects(raw_edges, "edge")?
            .into_iter()
            .enumerate()
            .map(|(i, map)| edge_from_map(map, path, i))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            nodes,
            edges,
            extra: root,
        })
    }

    /// The diagram as a JSON value, known fields first, passthrough fields after.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "nodes".to_string(),
            Value::Array(self.nodes.iter().map(node_to_value).collect()),
        );
        root.insert(
            "edges".to_string(),
            Value::Array(self.edges.iter().map(edge_to_value).collect()),
        );
        for (k, v) in &self.extra {
            root.insert(k.clone(), v.clone());
        }
        Value::Object(root)
    }

    /// Serialize as tab-indented JSON.
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_value().serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&DiagramEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges touching a node, as either endpoint.
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a DiagramEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from_node == node_id || e.to_node == node_id)
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.node(id).is_some() || self.edge(id).is_some()
    }

    /// A fresh 16-hex-digit id unused by any node or edge.
    pub fn generate_id(&self) -> String {
        loop {
            let candidate = uuid::Uuid::new_v4().simple().to_string()[..16].to_string();
            if !self.id_in_use(&candidate) {
                return candidate;
            }
        }
    }

    fn claim_id(&self, requested: Option<String>) -> Result<String> {
        match requested {
            Some(id) if self.id_in_use(&id) => Err(VaultError::IdCollision(id)),
            Some(id) => Ok(id),
            None => Ok(self.generate_id()),
        }
    }

    /// Add a node, returning its id.
    pub fn add_node(&mut self, mut node: DiagramNode, requested_id: Option<String>) -> Result<String> {
        node.id = self.claim_id(requested_id)?;
        let id = node.id.clone();
        self.nodes.push(node);
        Ok(id)
    }

    /// Add an edge between two existing nodes, returning its id.
    pub fn add_edge(&mut self, mut edge: DiagramEdge, requested_id: Option<String>) -> Result<String> {
        for endpoint in [&edge.from_node, &edge.to_node] {
            if self.node(endpoint).is_none() {
                return Err(VaultError::NodeNotFound(endpoint.clone()));
            }
        }
        edge.id = self.claim_id(requested_id)?;
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<DiagramEdge> {
        let idx = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| VaultError::EdgeNotFound(id.to_string()))?;
        Ok(self.edges.remove(idx))
    }

    /// Remove a node. Edges that reference it are removed too when `cascade`
    /// is set; otherwise their presence is a conflict.
    pub fn remove_node(&mut self, id: &str, cascade: bool) -> Result<NodeRemoval> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| VaultError::NodeNotFound(id.to_string()))?;

        let attached = self.edges_of(id).count();
        if attached > 0 && !cascade {
            return Err(VaultError::CascadeRequired {
                node: id.to_string(),
                edges: attached,
            });
        }

        let node = self.nodes.remove(idx);
        let (removed_edges, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.from_node == id || e.to_node == id);
        self.edges = kept;

        Ok(NodeRemoval {
            node,
            removed_edges,
        })
    }

    /// Check that ids are unique and every edge endpoint exists.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let mut seen = HashSet::new();
        for id in self.nodes.iter().map(|n| &n.id).chain(self.edges.iter().map(|e| &e.id)) {
            if !seen.insert(id.as_str()) {
                return Err(VaultError::IdCollision(id.clone()));
            }
        }
        for edge in &self.edges {
            for endpoint in [&edge.from_node, &edge.to_node] {
                if self.node(endpoint).is_none() {
                    return Err(VaultError::InvalidDiagram {
                        path: path.to_path_buf(),
                        message: format!("edge {} references missing node {}", edge.id, endpoint),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Serialize for Diagram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl DiagramNode {
    /// A node of the given kind with an id to be assigned on insertion.
    pub fn new(kind: NodeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: String::new(),
            kind,
            x: number_from_f64(x),
            y: number_from_f64(y),
            width: number_from_f64(width),
            height: number_from_f64(height),
            color: None,
            extra: Map::new(),
        }
    }
}

impl DiagramEdge {
    /// An edge with an id to be assigned on insertion.
    pub fn new(from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            from_node: from_node.into(),
            from_side: None,
            to_node: to_node.into(),
            to_side: None,
            label: None,
            color: None,
            extra: Map::new(),
        }
    }
}

fn node_from_map(map: Map<String, Value>, path: &Path, index: usize) -> Result<DiagramNode> {
    let mut f = Fields {
        map,
        path,
        what: format!("node #{}", index),
    };
    let id = f.required_str("id")?;
    f.what = format!("node {}", id);
    let type_name = f.required_str("type")?;

    let kind = match type_name.as_str() {
        "text" => NodeKind::Text {
            text: f.optional_str("text")?.unwrap_or_default(),
        },
        "file" => NodeKind::File {
            file: f.required_str("file")?,
            subpath: f.optional_str("subpath")?,
        },
        "link" => NodeKind::Link {
            url: f.required_str("url")?,
        },
        "group" => NodeKind::Group {
            label: f.optional_str("label")?,
        },
        _ => NodeKind::Other { type_name },
    };

    Ok(DiagramNode {
        id,
        kind,
        x: f.number("x")?,
        y: f.number("y")?,
        width: f.number("width")?,
        height: f.number("height")?,
        color: f.optional_str("color")?,
        extra: f.map,
    })
}

fn edge_from_map(map: Map<String, Value>, path: &Path, index: usize) -> Result<DiagramEdge> {
    let mut f = Fields {
        map,
        path,
        what: format!("edge #{}", index),
    };
    let id = f.required_str("id")?;
    f.what = format!("edge {}", id);

    Ok(DiagramEdge {
        id,
        from_node: f.required_str("fromNode")?,
        from_side: f.side("fromSide")?,
        to_node: f.required_str("toNode")?,
        to_side: f.side("toSide")?,
        label: f.optional_str("label")?,
        color: f.optional_str("color")?,
        extra: f.map,
    })
}

fn node_to_value(node: &DiagramNode) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), Value::String(node.id.clone()));
    map.insert("type".into(), Value::String(node.kind.type_name().to_string()));
    match &node.kind {
        NodeKind::Text { text } => {
            map.insert("text".into(), Value::String(text.clone()));
        }
        NodeKind::File { file, subpath } => {
            map.insert("file".into(), Value::String(file.clone()));
            if let Some(sub) = subpath {
                map.insert("subpath".into(), Value::String(sub.clone()));
            }
        }
        NodeKind::Link { url } => {
            map.insert("url".into(), Value::String(url.clone()));
        }
        NodeKind::Group { label } => {
            if let Some(label) = label {
                map.insert("label".into(), Value::String(label.clone()));
            }
        }
        NodeKind::Other { .. } => {}
    }
    map.insert("x".into(), Value::Number(node.x.clone()));
    map.insert("y".into(), Value::Number(node.y.clone()));
    map.insert("width".into(), Value::Number(node.width.clone()));
    map.insert("height".into(), Value::Number(node.height.clone()));
    if let Some(ref color) = node.color {
        map.insert("color".into(), Value::String(color.clone()));
    }
    for (k, v) in &node.extra {
        map.insert(k.clone(), v.clone());
    }
    Value::Object(map)
}

fn edge_to_value(edge: &DiagramEdge) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), Value::String(edge.id.clone()));
    map.insert("fromNode".into(), Value::String(edge.from_node.clone()));
    if let Some(side) = edge.from_side {
        map.insert("fromSide".into(), Value::String(side.as_str().to_string()));
    }
    map.insert("toNode".into(), Value::String(edge.to_node.clone()));
    if let Some(side) = edge.to_side {
        map.insert("toSide".into(), Value::String(side.as_str().to_string()));
    }
    if let Some(ref label) = edge.label {
        map.insert("label".into(), Value::String(label.clone()));
    }
    if let Some(ref color) = edge.color {
        map.insert("color".into(), Value::String(color.clone()));
    }
    for (k, v) in &edge.extra {
        map.insert(k.clone(), v.clone());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
	"nodes":[
		{"id":"a1","type":"text","text":"Hello","x":0,"y":0,"width":250,"height":60,"styleAttributes":{"shape":"pill"}},
		{"id":"b2","type":"file","file":"Notes/Plan.md","x":300,"y":0,"width":400,"height":400,"color":"4"},
		{"id":"c3","type":"widget","x":-10.5,"y":5,"width":10,"height":10,"widgetData":[1,2]}
	],
	"edges":[
		{"id":"e1","fromNode":"a1","fromSide":"right","toNode":"b2","toSide":"left","toEnd":"arrow","label":"see"}
	],
	"metadata":{"version":"1.0"}
}"#;

    fn sample() -> Diagram {
        Diagram::parse(SAMPLE, Path::new("d.canvas")).unwrap()
    }

    #[test]
    fn test_parse_kinds_and_passthrough() {
        let d = sample();
        assert_eq!(d.nodes.len(), 3);
        assert_eq!(d.nodes[0].kind, NodeKind::Text { text: "Hello".into() });
        assert!(d.nodes[0].extra.contains_key("styleAttributes"));
        assert_eq!(d.nodes[1].color.as_deref(), Some("4"));
        assert_eq!(d.nodes[2].kind.type_name(), "widget");
        assert_eq!(d.edges[0].from_side, Some(Side::Right));
        assert!(d.edges[0].extra.contains_key("toEnd"));
        assert!(d.extra.contains_key("metadata"));
    }

    #[test]
    fn test_serialize_then_parse_is_equivalent() {
        let d = sample();
        let text = d.to_json_string().unwrap();
        assert!(text.contains("\n\t\"nodes\""));
        let again = Diagram::parse(&text, Path::new("d.canvas")).unwrap();
        assert_eq!(d, again);
    }

    #[test]
    fn test_integer_coordinates_stay_integers() {
        let text = sample().to_json_string().unwrap();
        assert!(text.contains("\"width\": 250"));
        assert!(text.contains("\"x\": -10.5"));
    }

    #[test]
    fn test_whole_floats_keep_their_form() {
        let text = r#"{"nodes":[{"id":"n","type":"text","text":"t","x":10.0,"y":-0.0,"width":250,"height":60.5}]}"#;
        let d = Diagram::parse(text, Path::new("d.canvas")).unwrap();
        let out = d.to_json_string().unwrap();
        assert!(out.contains("\"x\": 10.0"));
        assert!(out.contains("\"width\": 250,"));
        assert!(out.contains("\"height\": 60.5"));

        let generated = DiagramNode::new(NodeKind::Text { text: String::new() }, 300.0, 0.5, 1.0, 1.0);
        assert_eq!(generated.x, Number::from(300));
        assert_eq!(generated.y.as_f64(), Some(0.5));
    }

    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(Diagram::parse("{}", Path::new("x")).unwrap(), Diagram::default());
        assert!(matches!(
            Diagram::parse("{not json", Path::new("x")),
            Err(VaultError::InvalidDiagram { .. })
        ));
        assert!(matches!(
            Diagram::parse(r#"{"nodes":[{"type":"text"}]}"#, Path::new("x")),
            Err(VaultError::InvalidDiagram { .. })
        ));
    }

    #[test]
    fn test_add_node_and_edge() {
        let mut d = sample();
        let id = d
            .add_node(DiagramNode::new(NodeKind::Link { url: "https://x.org".into() }, 0.0, 500.0, 200.0, 100.0), None)
            .unwrap();
        assert_eq!(id.len(), 16);
        let edge = d.add_edge(DiagramEdge::new("a1", id.clone()), None).unwrap();
        assert_ne!(edge, id);
        assert!(d.validate(Path::new("d.canvas")).is_ok());

        let missing = d.add_edge(DiagramEdge::new("a1", "nope"), None);
        assert!(matches!(missing, Err(VaultError::NodeNotFound(_))));

        let dup = d.add_node(DiagramNode::new(NodeKind::Group { label: None }, 0.0, 0.0, 1.0, 1.0), Some("a1".into()));
        assert!(matches!(dup, Err(VaultError::IdCollision(_))));
    }

    #[test]
    fn test_remove_node_cascade() {
        let mut d = sample();
        let refused = d.clone().remove_node("a1", false);
        assert!(matches!(refused, Err(VaultError::CascadeRequired { edges: 1, .. })));

        let removal = d.remove_node("a1", true).unwrap();
        assert_eq!(removal.removed_edges.len(), 1);
        assert!(d.edges.is_empty());
        assert!(d.validate(Path::new("d.canvas")).is_ok());

        // nothing attached, no cascade needed
        assert!(d.remove_node("c3", false).is_ok());
    }

    #[test]
    fn test_remove_edge() {
        let mut d = sample();
        assert_eq!(d.remove_edge("e1").unwrap().label.as_deref(), Some("see"));
        assert!(matches!(d.remove_edge("e1"), Err(VaultError::EdgeNotFound(_))));
    }
}
