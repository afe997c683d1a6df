//! Lazy, restartable enumeration of vault files.

use crate::config::Config;
use crate::error::{Result, VaultError};
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A subtree or entry skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Enumerates files with one extension under a root.
///
/// Every call to [`Scanner::iter`] walks the directory tree afresh.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    extension: String,
    excluded_dirs: Vec<String>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl Scanner {
    /// A scanner for files ending in `.{extension}`, filtered by the config's globs.
    pub fn new(root: impl Into<PathBuf>, extension: &str, config: &Config) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(VaultError::from))
                .collect()
        };
        Ok(Self {
            root: root.into(),
            extension: extension.to_string(),
            excluded_dirs: config.excluded_dirs.clone(),
            include: compile(&config.include)?,
            exclude: compile(&config.exclude)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk.
    pub fn iter(&self) -> ScanIter<'_> {
        let excluded = self.excluded_dirs.clone();
        let mut visited: HashSet<PathBuf> = HashSet::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                if e.depth() == 0 {
                    if let Ok(real) = std::fs::canonicalize(e.path()) {
                        visited.insert(real);
                    }
                    return true;
                }
                if is_hidden(e) || (e.file_type().is_dir() && is_excluded(e, &excluded)) {
                    return false;
                }
                if e.file_type().is_dir() {
                    // a directory reachable twice through symlinks is walked once
                    if let Ok(real) = std::fs::canonicalize(e.path()) {
                        if !visited.insert(real) {
                            tracing::debug!(path = %e.path().display(), "skipping already visited directory");
                            return false;
                        }
                    }
                }
                true
            });

        ScanIter {
            scanner: self,
            walker: Box::new(walker),
            warnings: Vec::new(),
        }
    }

    fn accepts(&self, relative: &Path) -> bool {
        let has_extension = relative
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
        if !has_extension {
            return false;
        }

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let text = relative.to_string_lossy().replace('\\', "/");
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches_with(&text, options)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches_with(&text, options))
    }
}

impl<'a> IntoIterator for &'a Scanner {
    type Item = PathBuf;
    type IntoIter = ScanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One walk over a vault. Yields relative paths; errors become warnings.
pub struct ScanIter<'a> {
    scanner: &'a Scanner,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
    warnings: Vec<ScanWarning>,
}

impl ScanIter<'_> {
    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }
}

impl Iterator for ScanIter<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                    self.warnings.push(ScanWarning {
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.scanner.root) else {
                continue;
            };
            if self.scanner.accepts(relative) {
                return Some(relative.to_path_buf());
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn is_excluded(entry: &DirEntry, excluded: &[String]) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| excluded.iter().any(|x| x == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_vault() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::create_dir_all(root.join("projects/sub")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("a.md"), "# A").unwrap();
        fs::write(root.join("projects/b.md"), "# B").unwrap();
        fs::write(root.join("projects/sub/c.MD"), "# C").unwrap();
        fs::write(root.join("projects/board.canvas"), "{}").unwrap();
        fs::write(root.join("templates/t.md"), "tpl").unwrap();
        fs::write(root.join(".obsidian/app.md"), "no").unwrap();
        fs::write(root.join(".hidden.md"), "no").unwrap();
        temp
    }

    fn scan(root: &Path, config: &Config, ext: &str) -> Vec<String> {
        let scanner = Scanner::new(root, ext, config).unwrap();
        let mut paths: Vec<String> = scanner
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_scan_skips_hidden_and_filters_extension() {
        let temp = create_test_vault();
        let paths = scan(temp.path(), &Config::default(), "md");
        assert_eq!(
            paths,
            vec!["a.md", "projects/b.md", "projects/sub/c.MD", "templates/t.md"]
        );
        assert_eq!(scan(temp.path(), &Config::default(), "canvas"), vec!["projects/board.canvas"]);
    }

    #[test]
    fn test_include_exclude_globs() {
        let temp = create_test_vault();
        let config = Config {
            exclude: vec!["templates/**".to_string()],
            ..Config::default()
        };
        assert!(!scan(temp.path(), &config, "md").contains(&"templates/t.md".to_string()));

        let config = Config {
            include: vec!["projects/**".to_string()],
            ..Config::default()
        };
        assert_eq!(scan(temp.path(), &config, "md"), vec!["projects/b.md", "projects/sub/c.MD"]);
    }

    #[test]
    fn test_restartable() {
        let temp = create_test_vault();
        let scanner = Scanner::new(temp.path(), "md", &Config::default()).unwrap();
        let first = scanner.iter().count();
        fs::write(temp.path().join("new.md"), "fresh").unwrap();
        let second = scanner.iter().count();
        assert_eq!(second, first + 1);
    }

    #[test]
    fn test_missing_root_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let scanner = Scanner::new(temp.path().join("nope"), "md", &Config::default()).unwrap();
        let mut iter = scanner.iter();
        assert!(iter.next().is_none());
        assert_eq!(iter.warnings().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = create_test_vault();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("projects/loop")).unwrap();
        let paths = scan(temp.path(), &Config::default(), "md");
        assert_eq!(paths.len(), 4);
    }
}
