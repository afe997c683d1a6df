//! Explicit configuration, built once and handed to `Vault::new`.

use crate::error::{Result, VaultError};
use crate::types::Priority;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the vault when `--vault` is absent.
pub const VAULT_ENV: &str = "VAULTSMITH_VAULT";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault used when neither the CLI nor the environment names one.
    pub default_vault: Option<PathBuf>,

    /// Extension of note files (without the dot).
    pub note_extension: String,

    /// Extension of diagram files (without the dot).
    pub diagram_extension: String,

    /// Directory names never descended into. Hidden directories are always skipped.
    pub excluded_dirs: Vec<String>,

    /// If non-empty, only relative paths matching one of these globs are scanned.
    pub include: Vec<String>,

    /// Relative paths matching any of these globs are skipped.
    pub exclude: Vec<String>,

    pub tags: TagConfig,
    pub tasks: TaskGlyphs,
    pub board: BoardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_vault: None,
            note_extension: "md".to_string(),
            diagram_extension: "canvas".to_string(),
            excluded_dirs: vec![
                ".obsidian".to_string(),
                ".trash".to_string(),
                ".git".to_string(),
            ],
            include: Vec::new(),
            exclude: Vec::new(),
            tags: TagConfig::default(),
            tasks: TaskGlyphs::default(),
            board: BoardConfig::default(),
        }
    }
}

impl Config {
    /// Location of the user config file, if a config dir exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vaultsmith").join("config.toml"))
    }

    /// Load the user config file, or defaults when it does not exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.note_extension.is_empty() || self.note_extension.starts_with('.') {
            return Err(VaultError::ConfigError(format!(
                "note_extension must be a bare extension, got {:?}",
                self.note_extension
            )));
        }
        for pattern in self.include.iter().chain(&self.exclude) {
            glob::Pattern::new(pattern)?;
        }
        Ok(())
    }

    /// Pick the vault root: CLI argument, then environment, then config file.
    pub fn resolve_vault_path(&self, cli_vault: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_vault {
            return Ok(path.to_path_buf());
        }
        if let Ok(env_path) = std::env::var(VAULT_ENV) {
            if !env_path.trim().is_empty() {
                return Ok(PathBuf::from(env_path));
            }
        }
        self.default_vault.clone().ok_or_else(|| {
            VaultError::ConfigError(format!(
                "no vault given: pass --vault, set {} or default_vault in the config file",
                VAULT_ENV
            ))
        })
    }
}

/// Tag matching policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Whether `#Rust` and `#rust` are different tags for search and editing.
    pub case_sensitive: bool,
}

impl TagConfig {
    /// Compare two tag names (without `#`) under this policy.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }
}

/// A glyph that marks a task priority tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityGlyph {
    pub glyph: String,
    pub priority: Priority,
}

/// Glyphs used by task lines for dates, recurrence and priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskGlyphs {
    pub due: String,
    pub scheduled: String,
    pub start: String,
    pub done: String,
    pub created: String,
    pub recurrence: String,
    pub priorities: Vec<PriorityGlyph>,
}

impl Default for TaskGlyphs {
    fn default() -> Self {
        let tier = |glyph: &str, priority| PriorityGlyph {
            glyph: glyph.to_string(),
            priority,
        };
        Self {
            due: "📅".to_string(),
            scheduled: "⏳".to_string(),
            start: "🛫".to_string(),
            done: "✅".to_string(),
            created: "➕".to_string(),
            recurrence: "🔁".to_string(),
            priorities: vec![
                tier("⏫", Priority::Highest),
                tier("🔼", Priority::High),
                tier("🔽", Priority::Low),
                tier("⏬", Priority::Lowest),
            ],
        }
    }
}

impl TaskGlyphs {
    /// Glyph for a priority tier; `Normal` has none.
    pub fn priority_glyph(&self, priority: Priority) -> Option<&str> {
        self.priorities
            .iter()
            .find(|p| p.priority == priority)
            .map(|p| p.glyph.as_str())
    }

    /// Every glyph that can start a metadata token.
    pub fn all_glyphs(&self) -> Vec<&str> {
        let mut glyphs = vec![
            self.due.as_str(),
            self.scheduled.as_str(),
            self.start.as_str(),
            self.done.as_str(),
            self.created.as_str(),
            self.recurrence.as_str(),
        ];
        glyphs.extend(self.priorities.iter().map(|p| p.glyph.as_str()));
        glyphs
    }
}

/// How a kanban card counts as done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardCompletion {
    /// Done iff the checkbox is checked.
    #[default]
    Checkbox,
    /// Done iff the card sits in a done lane.
    Lane,
    /// Done if either holds.
    Either,
}

/// Kanban board policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Column names treated as done lanes (compared case-insensitively).
    pub done_lanes: Vec<String>,
    pub completion: CardCompletion,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            done_lanes: vec!["Done".to_string(), "Complete".to_string()],
            completion: CardCompletion::Checkbox,
        }
    }
}

impl BoardConfig {
    pub fn is_done_lane(&self, name: &str) -> bool {
        self.done_lanes
            .iter()
            .any(|lane| lane.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.note_extension, "md");
        assert!(config.excluded_dirs.contains(&".obsidian".to_string()));
        assert!(!config.tags.case_sensitive);
        assert_eq!(config.tasks.priority_glyph(Priority::High), Some("🔼"));
        assert_eq!(config.tasks.priority_glyph(Priority::Normal), None);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml_str(
            r#"
            exclude = ["templates/**"]

            [tags]
            case_sensitive = true

            [board]
            completion = "either"
            "#,
        )
        .unwrap();
        assert_eq!(config.exclude, vec!["templates/**"]);
        assert!(config.tags.case_sensitive);
        assert_eq!(config.board.completion, CardCompletion::Either);
        // untouched sections keep their defaults
        assert_eq!(config.tasks.due, "📅");
        assert_eq!(config.diagram_extension, "canvas");
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let result = Config::from_toml_str("note_extension = \".md\"");
        assert!(matches!(result, Err(VaultError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let result = Config::from_toml_str("include = [\"[unclosed\"]");
        assert!(matches!(result, Err(VaultError::GlobPattern(_))));
    }

    #[test]
    fn test_tag_matching_policy() {
        let insensitive = TagConfig::default();
        assert!(insensitive.matches("Rust", "rust"));

        let sensitive = TagConfig { case_sensitive: true };
        assert!(!sensitive.matches("Rust", "rust"));
        assert!(sensitive.matches("rust", "rust"));
    }

    #[test]
    fn test_resolve_vault_path_prefers_cli() {
        let config = Config {
            default_vault: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let resolved = config
            .resolve_vault_path(Some(Path::new("/from/cli")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_done_lane() {
        let board = BoardConfig::default();
        assert!(board.is_done_lane("done"));
        assert!(board.is_done_lane(" Complete "));
        assert!(!board.is_done_lane("Doing"));
    }
}
