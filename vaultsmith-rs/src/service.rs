//! Boundary to a running vault application.
//!
//! Some operations only make sense against a live editor: the active file,
//! navigation history, command palette, dataview queries and templates.
//! They are expressed here as typed requests and responses behind the
//! [`VaultService`] trait. No transport ships with the crate; callers plug
//! in their own client.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Query verbs a dataview query may start with.
pub const DQL_VERBS: [&str; 4] = ["LIST", "TABLE", "TASK", "CALENDAR"];

/// A request to a running vault application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "kebab-case")]
pub enum ServiceRequest {
    GetActiveFile,
    OpenFile {
        path: PathBuf,
        /// Open in a new pane instead of replacing the current one.
        #[serde(default)]
        new_leaf: bool,
    },
    CloseActiveFile,
    NavigateBack,
    NavigateForward,
    ToggleEditMode,
    ExecuteCommand {
        id: String,
    },
    ListCommands,
    SearchCommands {
        query: String,
    },
    ExecuteQuery {
        query: String,
    },
    RenderTemplate {
        template: PathBuf,
        /// Note the rendered text is meant for; the active file when absent.
        #[serde(default)]
        target: Option<PathBuf>,
    },
}

impl ServiceRequest {
    /// An `ExecuteQuery` request for raw query text, verb checked.
    pub fn execute_query(query: &str) -> Result<Self> {
        validate_dql(query)?;
        Ok(ServiceRequest::ExecuteQuery {
            query: query.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "kebab-case")]
pub enum ServiceResponse {
    /// The request was carried out and has nothing to report.
    Done,
    ActiveFile {
        path: PathBuf,
        #[serde(default)]
        content: Option<String>,
    },
    /// No file is open.
    NoActiveFile,
    Commands {
        commands: Vec<CommandInfo>,
    },
    QueryResult {
        query: String,
        result: serde_json::Value,
    },
    Rendered {
        text: String,
    },
}

/// A live vault application.
pub trait VaultService {
    /// Carry out one request.
    fn call(&mut self, request: ServiceRequest) -> Result<ServiceResponse>;

    /// Commands whose id or name contains `query`, case-insensitively.
    ///
    /// Lists every command and filters locally.
    fn search_commands(&mut self, query: &str) -> Result<Vec<CommandInfo>> {
        match self.call(ServiceRequest::ListCommands)? {
            ServiceResponse::Commands { commands } => Ok(filter_commands(commands, query)),
            other => Err(unexpected("commands", &other)),
        }
    }

    /// Run a built query and return its raw result.
    fn query(&mut self, query: &DqlQuery) -> Result<serde_json::Value> {
        match self.call(query.to_request())? {
            ServiceResponse::QueryResult { result, .. } => Ok(result),
            other => Err(unexpected("query-result", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &ServiceResponse) -> VaultError {
    VaultError::Service(format!("expected a {} response, got {:?}", wanted, got))
}

pub fn filter_commands(commands: Vec<CommandInfo>, query: &str) -> Vec<CommandInfo> {
    let query = query.to_lowercase();
    commands
        .into_iter()
        .filter(|c| c.id.to_lowercase().contains(&query) || c.name.to_lowercase().contains(&query))
        .collect()
}

/// Check that `query` starts with a dataview verb.
pub fn validate_dql(query: &str) -> Result<()> {
    let verb = query.split_whitespace().next().unwrap_or("").to_uppercase();
    if DQL_VERBS.contains(&verb.as_str()) {
        Ok(())
    } else {
        Err(VaultError::InvalidQuery(format!(
            "'{}' does not start with one of {}",
            query.trim(),
            DQL_VERBS.join(", ")
        )))
    }
}

/// A dataview query assembled from clauses.
///
/// List-style queries render as `TABLE file.name ...`, since table
/// queries are the form every query endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DqlQuery {
    fields: Vec<String>,
    from: Option<String>,
    filter: Option<String>,
    sort: Option<String>,
    limit: Option<usize>,
}

impl DqlQuery {
    fn listing(from: String) -> Self {
        Self {
            fields: vec!["file.name".to_string()],
            from: Some(from),
            filter: None,
            sort: None,
            limit: None,
        }
    }

    /// Notes carrying `tag` (with or without the leading `#`).
    pub fn list_from_tag(tag: &str) -> Self {
        Self::listing(format!("#{}", tag.trim().trim_start_matches('#')))
    }

    /// Notes under `folder`.
    pub fn list_from_folder(folder: &str) -> Self {
        Self::listing(format!("\"{}\"", folder.trim().trim_matches('"')))
    }

    /// A table of the given fields. At least one field is required.
    pub fn table<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Result<Self> {
        let fields: Vec<String> = fields
            .into_iter()
            .map(Into::into)
            .filter(|f| !f.trim().is_empty())
            .collect();
        if fields.is_empty() {
            return Err(VaultError::InvalidQuery(
                "a table query needs at least one field".to_string(),
            ));
        }
        Ok(Self {
            fields,
            from: None,
            filter: None,
            sort: None,
            limit: None,
        })
    }

    pub fn from(mut self, source: impl Into<String>) -> Self {
        self.from = Some(source.into());
        self
    }

    /// Set the `WHERE` clause.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.filter = Some(condition.into());
        self
    }

    pub fn sort(mut self, order: impl Into<String>) -> Self {
        self.sort = Some(order.into());
        self
    }

    /// Cap the number of rows. Zero means no cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn to_request(&self) -> ServiceRequest {
        ServiceRequest::ExecuteQuery {
            query: self.to_string(),
        }
    }
}

impl fmt::Display for DqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TABLE {}", self.fields.join(", "))?;
        if let Some(from) = &self.from {
            write!(f, " FROM {}", from)?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        if let Some(sort) = &self.sort {
            write!(f, " SORT {}", sort)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}
