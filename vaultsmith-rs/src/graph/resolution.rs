//! Link target resolution.
//!
//! A link resolves in this order:
//! 1. Full vault path, case-insensitive, with or without the note extension
//! 2. For markdown links, a path relative to the linking note's folder
//! 3. File name alone (case-insensitive; the lexically first path wins)

use crate::parser::is_attachment;
use crate::types::{Link, LinkKind};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Outcome of resolving one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Note(PathBuf),
    /// A link to a non-note file (image, PDF, ...). Never an edge, never broken.
    Attachment,
    Broken,
}

/// Lookup tables over every note path in a vault.
#[derive(Debug, Default)]
pub struct PathIndex {
    extension: String,
    by_path: HashMap<String, PathBuf>,
    by_name: HashMap<String, PathBuf>,
}

impl PathIndex {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_lowercase(),
            ..Self::default()
        }
    }

    /// Build an index from relative note paths.
    pub fn from_paths(extension: &str, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut index = Self::new(extension);
        for path in paths {
            index.insert(path);
        }
        index
    }

    pub fn insert(&mut self, path: PathBuf) {
        let key = self.key(&path.to_string_lossy());
        if let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) {
            match self.by_name.get(&name) {
                Some(existing) if existing <= &path => {}
                _ => {
                    self.by_name.insert(name, path.clone());
                }
            }
        }
        self.by_path.insert(key, path);
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(&self.key(&path.to_string_lossy()))
    }

    /// Normalized lookup key: forward slashes, no leading `./` or `/`,
    /// no note extension, lowercase.
    fn key(&self, target: &str) -> String {
        let mut key = target.trim().replace('\\', "/");
        while let Some(rest) = key.strip_prefix("./").or_else(|| key.strip_prefix('/')) {
            key = rest.to_string();
        }
        let lower = key.to_lowercase();
        let suffix = format!(".{}", self.extension);
        match lower.strip_suffix(&suffix) {
            Some(stripped) => stripped.to_string(),
            None => lower,
        }
    }

    /// Resolve the target of `link`, written in the note at `source`.
    pub fn resolve(&self, link: &Link, source: &Path) -> Resolution {
        let target = link.target.trim();
        if target.is_empty() {
            return Resolution::Broken;
        }

        let key = self.key(target);
        if let Some(path) = self.by_path.get(&key) {
            return Resolution::Note(path.clone());
        }

        if link.kind == LinkKind::Markdown {
            if let Some(joined) = relative_to(source, target) {
                if let Some(path) = self.by_path.get(&self.key(&joined)) {
                    return Resolution::Note(path.clone());
                }
            }
        }

        if is_attachment(target) {
            return Resolution::Attachment;
        }

        if !key.contains('/') {
            if let Some(path) = self.by_name.get(&key) {
                return Resolution::Note(path.clone());
            }
        }

        Resolution::Broken
    }
}

// `target` taken relative to the folder of `source`, with `.` and `..`
// folded lexically. `None` if it climbs above the vault root.
fn relative_to(source: &Path, target: &str) -> Option<String> {
    let base = source.parent().unwrap_or(Path::new(""));
    let mut parts: Vec<String> = Vec::new();
    for component in base.join(target.replace('\\', "/")).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            _ => {}
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_links;

    fn index() -> PathIndex {
        PathIndex::from_paths(
            "md",
            [
                "Home.md",
                "projects/Plan.md",
                "archive/Plan.md",
                "projects/notes/Launch Draft.md",
            ]
            .into_iter()
            .map(PathBuf::from),
        )
    }

    fn resolve(text: &str, source: &str) -> Resolution {
        let link = parse_links(text).remove(0);
        index().resolve(&link, Path::new(source))
    }

    #[test]
    fn test_full_path_and_extension() {
        assert_eq!(resolve("[[home]]", "x.md"), Resolution::Note("Home.md".into()));
        assert_eq!(
            resolve("[[Projects/plan.md]]", "x.md"),
            Resolution::Note("projects/Plan.md".into())
        );
    }

    #[test]
    fn test_name_match_prefers_lexically_first() {
        assert_eq!(resolve("[[Plan]]", "x.md"), Resolution::Note("archive/Plan.md".into()));
    }

    #[test]
    fn test_markdown_relative_path() {
        assert_eq!(
            resolve("[draft](notes/Launch%20Draft.md)", "projects/Plan.md"),
            Resolution::Note("projects/notes/Launch Draft.md".into())
        );
        assert_eq!(
            resolve("[home](../Home.md)", "projects/Plan.md"),
            Resolution::Note("Home.md".into())
        );
    }

    #[test]
    fn test_broken_and_attachment() {
        assert_eq!(resolve("[[NoExist]]", "x.md"), Resolution::Broken);
        assert_eq!(resolve("![[diagram.png]]", "x.md"), Resolution::Attachment);
        assert_eq!(resolve("[[missing/Plan]]", "x.md"), Resolution::Broken);
    }

    #[test]
    fn test_heading_suffix_ignored() {
        assert_eq!(resolve("[[Home#Intro|start]]", "x.md"), Resolution::Note("Home.md".into()));
    }
}
