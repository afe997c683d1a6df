//! Inline field search command.

use crate::cli::args::FieldsArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::query::{FieldMatch, search_fields};
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FieldsOutput {
    pub key: String,
    pub matches: Vec<FieldMatch>,
    pub total: usize,
}

pub fn run(vault: &Vault, args: &FieldsArgs, output: &Output) -> Result<()> {
    let found = search_fields(vault, &args.key, args.value.as_deref())?;
    output.warnings(&found.skipped);
    output.print(&FieldsOutput {
        key: args.key.clone(),
        total: found.matches.len(),
        matches: found.matches,
    })
}
