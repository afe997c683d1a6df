//! Vault representation: a root directory plus its configuration.

use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::note::Note;
use crate::parser::canvas::Diagram;
use crate::scan::Scanner;
use std::path::{Component, Path, PathBuf};

/// An Obsidian-style vault on disk.
#[derive(Debug, Clone)]
pub struct Vault {
    /// Root path of the vault.
    pub root: PathBuf,
    pub config: Config,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(VaultError::VaultNotFound(root));
        }
        Ok(Self { root, config })
    }

    /// Scanner over note files.
    pub fn notes(&self) -> Result<Scanner> {
        Scanner::new(&self.root, &self.config.note_extension, &self.config)
    }

    /// Scanner over diagram files.
    pub fn diagrams(&self) -> Result<Scanner> {
        Scanner::new(&self.root, &self.config.diagram_extension, &self.config)
    }

    /// All note paths, sorted.
    pub fn list_notes(&self) -> Result<Vec<PathBuf>> {
        let scanner = self.notes()?;
        let mut notes: Vec<PathBuf> = scanner.iter().collect();
        notes.sort();
        Ok(notes)
    }

    /// Get the full path to a vault file.
    pub fn note_path(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Add the note extension if the path has none.
    pub fn normalize_note_path(&self, path: &str) -> PathBuf {
        with_extension(path, &self.config.note_extension)
    }

    pub fn note_exists(&self, relative_path: &Path) -> bool {
        self.note_path(relative_path).is_file()
    }

    /// Read a note fresh from disk.
    pub fn load_note(&self, relative_path: &Path) -> Result<Note> {
        check_inside(relative_path)?;
        Note::load(&self.root, relative_path)
    }

    /// Read and parse a diagram fresh from disk.
    pub fn load_diagram(&self, relative_path: &Path) -> Result<Diagram> {
        check_inside(relative_path)?;
        let text = std::fs::read_to_string(self.note_path(relative_path))
            .map_err(|e| VaultError::from_io(relative_path, e))?;
        Diagram::parse(&text, relative_path)
    }

    /// Resolve a user-supplied note reference to a relative path.
    ///
    /// Tries the path as given (with the note extension added), then a
    /// case-insensitive match on the path or the file stem.
    pub fn resolve_note(&self, query: &str) -> Result<PathBuf> {
        self.resolve_in(query, &self.config.note_extension, self.notes()?)
    }

    /// Resolve a diagram reference the same way.
    pub fn resolve_diagram(&self, query: &str) -> Result<PathBuf> {
        self.resolve_in(query, &self.config.diagram_extension, self.diagrams()?)
    }

    fn resolve_in(&self, query: &str, extension: &str, scanner: Scanner) -> Result<PathBuf> {
        let normalized = with_extension(query, extension);
        check_inside(&normalized)?;
        if self.note_exists(&normalized) {
            return Ok(normalized);
        }

        let wanted = strip_extension(query.trim(), extension).to_lowercase();
        let mut matches: Vec<PathBuf> = scanner
            .iter()
            .filter(|path| {
                let text = path.to_string_lossy().replace('\\', "/");
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_lowercase());
                strip_extension(&text, extension).to_lowercase() == wanted
                    || stem.as_deref() == Some(wanted.as_str())
            })
            .collect();
        matches.sort();

        match matches.len() {
            0 => Err(VaultError::NoteNotFound(PathBuf::from(query))),
            1 => Ok(matches.remove(0)),
            count => Err(VaultError::Ambiguous {
                what: "note",
                query: query.to_string(),
                count,
            }),
        }
    }
}

fn with_extension(path: &str, extension: &str) -> PathBuf {
    let path = path.trim();
    let suffix = format!(".{}", extension);
    if path.to_lowercase().ends_with(&suffix.to_lowercase()) {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{}{}", path, suffix))
    }
}

fn strip_extension<'a>(path: &'a str, extension: &str) -> &'a str {
    let cut = path.len().saturating_sub(extension.len() + 1);
    match path.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(&format!(".{}", extension)) => &path[..cut],
        _ => path,
    }
}

/// Reject paths that would escape the vault root.
fn check_inside(relative: &Path) -> Result<()> {
    let escapes = relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        Err(VaultError::NoteNotFound(relative.to_path_buf()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_vault() -> (TempDir, Vault) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("projects")).unwrap();
        fs::create_dir_all(temp.path().join("archive")).unwrap();
        fs::write(temp.path().join("Home.md"), "# Home").unwrap();
        fs::write(temp.path().join("projects/Plan.md"), "# Plan").unwrap();
        fs::write(temp.path().join("archive/Plan.md"), "# Old plan").unwrap();
        fs::write(temp.path().join("projects/Map.canvas"), "{}").unwrap();
        let vault = Vault::new(temp.path(), Config::default()).unwrap();
        (temp, vault)
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = Vault::new(temp.path().join("nope"), Config::default());
        assert!(matches!(result, Err(VaultError::VaultNotFound(_))));
    }

    #[test]
    fn test_list_notes_sorted() {
        let (_temp, vault) = setup_test_vault();
        let notes = vault.list_notes().unwrap();
        assert_eq!(
            notes,
            vec![
                PathBuf::from("Home.md"),
                PathBuf::from("archive/Plan.md"),
                PathBuf::from("projects/Plan.md"),
            ]
        );
    }

    #[test]
    fn test_normalize_note_path() {
        let (_temp, vault) = setup_test_vault();
        assert_eq!(vault.normalize_note_path("Home"), PathBuf::from("Home.md"));
        assert_eq!(vault.normalize_note_path("Home.md"), PathBuf::from("Home.md"));
    }

    #[test]
    fn test_resolve_note() {
        let (_temp, vault) = setup_test_vault();
        assert_eq!(vault.resolve_note("home").unwrap(), PathBuf::from("Home.md"));
        assert_eq!(
            vault.resolve_note("projects/plan").unwrap(),
            PathBuf::from("projects/Plan.md")
        );
        assert!(matches!(
            vault.resolve_note("Plan"),
            Err(VaultError::Ambiguous { count: 2, .. })
        ));
        assert!(matches!(
            vault.resolve_note("Missing"),
            Err(VaultError::NoteNotFound(_))
        ));
    }

    #[test]
    fn test_paths_cannot_escape() {
        let (_temp, vault) = setup_test_vault();
        assert!(vault.load_note(Path::new("../outside.md")).is_err());
    }

    #[test]
    fn test_load_diagram() {
        let (_temp, vault) = setup_test_vault();
        let path = vault.resolve_diagram("Map").unwrap();
        assert_eq!(path, PathBuf::from("projects/Map.canvas"));
        assert!(vault.load_diagram(&path).unwrap().nodes.is_empty());
    }
}
