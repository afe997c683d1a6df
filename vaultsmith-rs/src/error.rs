//! Error types, error kinds and exit codes for vaultsmith.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes used by the CLI.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const MALFORMED: i32 = 3;
    pub const AMBIGUOUS: i32 = 4;
    pub const CONFLICT: i32 = 5;
    pub const IO_FAILURE: i32 = 6;
    pub const CONFIG: i32 = 7;
}

/// The coarse category every error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    Malformed,
    Ambiguous,
    Conflict,
    IoFailure,
    Config,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::NotFound => exit_code::NOT_FOUND,
            ErrorKind::Malformed => exit_code::MALFORMED,
            ErrorKind::Ambiguous => exit_code::AMBIGUOUS,
            ErrorKind::Conflict => exit_code::CONFLICT,
            ErrorKind::IoFailure => exit_code::IO_FAILURE,
            ErrorKind::Config => exit_code::CONFIG,
        }
    }
}

/// Main error type for vaultsmith operations.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Note not found: {0}")]
    NoteNotFound(PathBuf),

    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),

    #[error("Heading not found in {note}: {heading}")]
    HeadingNotFound { note: PathBuf, heading: String },

    #[error("Block not found in {note}: ^{id}")]
    BlockNotFound { note: PathBuf, id: String },

    #[error("Column not found in {note}: {column}")]
    ColumnNotFound { note: PathBuf, column: String },

    #[error("Card not found in column '{column}': {card}")]
    CardNotFound { column: String, card: String },

    #[error("No task on line {line} of {note}")]
    TaskNotFound { note: PathBuf, line: usize },

    #[error("Inline field not found in {note}: {key}")]
    FieldNotFound { note: PathBuf, key: String },

    #[error("Diagram node not found: {0}")]
    NodeNotFound(String),

    #[error("Diagram edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Invalid frontmatter in {path}: {message}")]
    InvalidFrontmatter { path: PathBuf, message: String },

    #[error("Invalid diagram in {path}: {message}")]
    InvalidDiagram { path: PathBuf, message: String },

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid tag name: {0}")]
    InvalidTag(String),

    #[error("Invalid recurrence rule '{0}' (expected 'every ...')")]
    InvalidRecurrence(String),

    #[error("Invalid line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    #[error("Ambiguous {what}: {count} matches for '{query}'")]
    Ambiguous {
        what: &'static str,
        query: String,
        count: usize,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vault service error: {0}")]
    Service(String),

    #[error("Diagram id already in use: {0}")]
    IdCollision(String),

    #[error("Removing node {node} would orphan {edges} edge(s); retry with cascade")]
    CascadeRequired { node: String, edges: usize },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl VaultError {
    /// The error category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::NoteNotFound(_)
            | VaultError::VaultNotFound(_)
            | VaultError::HeadingNotFound { .. }
            | VaultError::BlockNotFound { .. }
            | VaultError::ColumnNotFound { .. }
            | VaultError::CardNotFound { .. }
            | VaultError::TaskNotFound { .. }
            | VaultError::FieldNotFound { .. }
            | VaultError::NodeNotFound(_)
            | VaultError::EdgeNotFound(_) => ErrorKind::NotFound,

            VaultError::InvalidFrontmatter { .. }
            | VaultError::InvalidDiagram { .. }
            | VaultError::InvalidDate(_)
            | VaultError::InvalidPriority(_)
            | VaultError::InvalidTag(_)
            | VaultError::InvalidRecurrence(_)
            | VaultError::InvalidLine { .. }
            | VaultError::InvalidQuery(_)
            | VaultError::YamlParse(_)
            | VaultError::JsonError(_) => ErrorKind::Malformed,

            VaultError::Ambiguous { .. } => ErrorKind::Ambiguous,

            VaultError::IdCollision(_) | VaultError::CascadeRequired { .. } => ErrorKind::Conflict,

            VaultError::AtomicWrite { .. } | VaultError::Io(_) | VaultError::Service(_) => {
                ErrorKind::IoFailure
            }

            VaultError::ConfigError(_)
            | VaultError::TomlParse(_)
            | VaultError::TomlSerialize(_)
            | VaultError::GlobPattern(_) => ErrorKind::Config,
        }
    }

    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Map an io error on `path` to `NoteNotFound` when the file is missing.
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => VaultError::NoteNotFound(path.to_path_buf()),
            _ => VaultError::Io(error),
        }
    }
}

/// Result type alias for vaultsmith operations.
pub type Result<T> = std::result::Result<T, VaultError>;
