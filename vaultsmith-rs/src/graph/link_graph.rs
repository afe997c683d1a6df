//! Link graph construction and querying.

use super::resolution::{PathIndex, Resolution};
use crate::error::Result;
use crate::note::Note;
use crate::scan::ScanWarning;
use crate::types::{Link, LinkKind};
use crate::vault::Vault;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// A resolved link between two notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: PathBuf,
    pub target: PathBuf,
    /// The link as written in `source`.
    pub link: Link,
}

/// A link whose target matches no note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    pub source: PathBuf,
    /// The target as written.
    pub target: String,
    pub line: usize,
    pub kind: LinkKind,
}

/// An unresolved target, with how many links point at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stub {
    pub target: String,
    pub references: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubEntry {
    pub path: PathBuf,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree: usize,
}

/// Which links a traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

/// Notes first reached at one distance from the start note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub distance: usize,
    pub notes: Vec<PathBuf>,
}

/// Link health of the whole vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connectivity {
    pub notes: usize,
    /// Resolved plus broken links; attachments are not counted.
    pub links: usize,
    pub resolved: usize,
    pub broken: usize,
    pub attachments: usize,
    pub resolved_ratio: f64,
    pub average_degree: f64,
    pub zero_degree: usize,
    pub without_inlinks: usize,
    pub without_outlinks: usize,
    /// Resolved edges over the n(n-1) possible directed pairs.
    pub link_density: f64,
}

/// A directed graph of the notes in a vault, built fresh per request.
///
/// Nodes are note paths. Edges are resolved links. Unresolved targets are
/// kept as stubs and never count towards degrees.
#[derive(Debug, Default)]
pub struct LinkGraph {
    notes: BTreeSet<PathBuf>,
    edges: Vec<Edge>,
    broken: Vec<BrokenLink>,
    attachments: usize,
    outgoing: HashMap<PathBuf, Vec<usize>>,
    incoming: HashMap<PathBuf, Vec<usize>>,
    skipped: Vec<ScanWarning>,
}

impl LinkGraph {
    /// Build the graph for a vault.
    pub fn build(vault: &Vault) -> Result<Self> {
        Self::build_with(vault, |_| {})
    }

    /// Build the graph, handing every successfully read note to `visit` as
    /// it streams past. Notes are not retained.
    pub fn build_with(vault: &Vault, mut visit: impl FnMut(&Note)) -> Result<Self> {
        let scanner = vault.notes()?;

        // first pass: path index only, no file reads
        let mut walk = scanner.iter();
        let index = PathIndex::from_paths(&vault.config.note_extension, walk.by_ref());
        let mut graph = LinkGraph {
            skipped: walk.into_warnings(),
            ..LinkGraph::default()
        };

        let mut walk = scanner.iter();
        for path in walk.by_ref() {
            let note = match vault.load_note(&path) {
                Ok(note) => note,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable note");
                    graph.skipped.push(ScanWarning {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            visit(&note);
            graph.add_note(&note, &index);
        }
        for warning in walk.into_warnings() {
            if !graph.skipped.contains(&warning) {
                graph.skipped.push(warning);
            }
        }

        tracing::debug!(
            notes = graph.notes.len(),
            edges = graph.edges.len(),
            broken = graph.broken.len(),
            "built link graph"
        );
        Ok(graph)
    }

    /// Build from in-memory notes. Paths not among `notes` do not resolve.
    pub fn from_notes<'n>(extension: &str, notes: impl IntoIterator<Item = &'n Note> + Clone) -> Self {
        let index = PathIndex::from_paths(extension, notes.clone().into_iter().map(|n| n.path.clone()));
        let mut graph = LinkGraph::default();
        for note in notes {
            graph.add_note(note, &index);
        }
        graph
    }

    fn add_note(&mut self, note: &Note, index: &PathIndex) {
        self.notes.insert(note.path.clone());
        for link in note.links() {
            match index.resolve(&link, &note.path) {
                Resolution::Note(target) => {
                    let id = self.edges.len();
                    self.outgoing.entry(note.path.clone()).or_default().push(id);
                    self.incoming.entry(target.clone()).or_default().push(id);
                    self.edges.push(Edge {
                        source: note.path.clone(),
                        target,
                        link,
                    });
                }
                Resolution::Attachment => self.attachments += 1,
                Resolution::Broken => self.broken.push(BrokenLink {
                    source: note.path.clone(),
                    target: link.target.clone(),
                    line: link.line,
                    kind: link.kind,
                }),
            }
        }
    }

    /// All note paths, sorted.
    pub fn notes(&self) -> impl Iterator<Item = &PathBuf> {
        self.notes.iter()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.notes.contains(path)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Notes or subtrees the build could not read.
    pub fn skipped(&self) -> &[ScanWarning] {
        &self.skipped
    }

    fn edges_at<'g>(&'g self, map: &'g HashMap<PathBuf, Vec<usize>>, path: &Path) -> Vec<&'g Edge> {
        map.get(path)
            .map(|ids| ids.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    /// Resolved links leaving `path`, in document order.
    pub fn outgoing(&self, path: &Path) -> Vec<&Edge> {
        self.edges_at(&self.outgoing, path)
    }

    /// Resolved links pointing at `path`, ordered by source then line.
    pub fn backlinks(&self, path: &Path) -> Vec<&Edge> {
        let mut edges = self.edges_at(&self.incoming, path);
        edges.sort_by(|a, b| {
            (&a.source, a.link.line, a.link.start_col).cmp(&(&b.source, b.link.line, b.link.start_col))
        });
        edges
    }

    /// Broken links, ordered by source then line.
    pub fn broken_links(&self) -> Vec<&BrokenLink> {
        let mut broken: Vec<&BrokenLink> = self.broken.iter().collect();
        broken.sort_by(|a, b| (&a.source, a.line).cmp(&(&b.source, b.line)));
        broken
    }

    /// Unresolved targets grouped case-insensitively, most referenced first.
    pub fn stubs(&self) -> Vec<Stub> {
        let mut groups: BTreeMap<String, (String, usize)> = BTreeMap::new();
        for link in &self.broken {
            let entry = groups
                .entry(link.target.to_lowercase())
                .or_insert_with(|| (link.target.clone(), 0));
            entry.1 += 1;
        }
        let mut stubs: Vec<Stub> = groups
            .into_values()
            .map(|(target, references)| Stub { target, references })
            .collect();
        stubs.sort_by(|a, b| b.references.cmp(&a.references).then_with(|| a.target.cmp(&b.target)));
        stubs
    }

    pub fn in_degree(&self, path: &Path) -> usize {
        self.incoming.get(path).map_or(0, Vec::len)
    }

    pub fn out_degree(&self, path: &Path) -> usize {
        self.outgoing.get(path).map_or(0, Vec::len)
    }

    /// Notes with no resolved links in either direction, sorted.
    pub fn orphans(&self) -> Vec<&PathBuf> {
        self.notes
            .iter()
            .filter(|p| self.in_degree(p) == 0 && self.out_degree(p) == 0)
            .collect()
    }

    /// Notes whose degree exceeds `threshold`; without one, the `top_k`
    /// best connected. Ordered by degree, ties by path.
    pub fn hubs(&self, threshold: Option<usize>, top_k: usize) -> Vec<HubEntry> {
        let mut entries: Vec<HubEntry> = self
            .notes
            .iter()
            .map(|path| {
                let in_degree = self.in_degree(path);
                let out_degree = self.out_degree(path);
                HubEntry {
                    path: path.clone(),
                    in_degree,
                    out_degree,
                    degree: in_degree + out_degree,
                }
            })
            .filter(|e| e.degree > 0)
            .collect();
        entries.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.path.cmp(&b.path)));

        match threshold {
            Some(threshold) => entries.retain(|e| e.degree > threshold),
            None => entries.truncate(top_k),
        }
        entries
    }

    pub fn connectivity(&self) -> Connectivity {
        let notes = self.notes.len();
        let resolved = self.edges.len();
        let broken = self.broken.len();
        let links = resolved + broken;
        let without_inlinks = self.notes.iter().filter(|p| self.in_degree(p) == 0).count();
        let without_outlinks = self.notes.iter().filter(|p| self.out_degree(p) == 0).count();
        let possible = notes.saturating_mul(notes.saturating_sub(1));

        Connectivity {
            notes,
            links,
            resolved,
            broken,
            attachments: self.attachments,
            resolved_ratio: ratio(resolved, links),
            average_degree: ratio(resolved * 2, notes),
            zero_degree: self.orphans().len(),
            without_inlinks,
            without_outlinks,
            link_density: ratio(resolved, possible),
        }
    }

    fn neighbors(&self, path: &Path, direction: Direction) -> BTreeSet<&PathBuf> {
        let mut out = BTreeSet::new();
        if direction != Direction::Incoming {
            out.extend(self.outgoing(path).into_iter().map(|e| &e.target));
        }
        if direction != Direction::Outgoing {
            out.extend(self.edges_at(&self.incoming, path).into_iter().map(|e| &e.source));
        }
        out
    }

    /// Breadth-first expansion from `start` up to `depth` hops. Each note is
    /// reported once, at its shortest distance; the start note is excluded.
    pub fn connections(&self, start: &Path, depth: usize, direction: Direction) -> Vec<Hop> {
        let mut seen: HashSet<&Path> = HashSet::from([start]);
        let mut frontier: VecDeque<&Path> = VecDeque::from([start]);
        let mut hops = Vec::new();

        for distance in 1..=depth {
            let mut next = BTreeSet::new();
            while let Some(path) = frontier.pop_front() {
                for neighbor in self.neighbors(path, direction) {
                    if seen.insert(neighbor.as_path()) {
                        next.insert(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier.extend(next.iter().copied().map(PathBuf::as_path));
            hops.push(Hop {
                distance,
                notes: next.into_iter().cloned().collect(),
            });
        }
        hops
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
