//! Note editing commands. Each one applies a single mutation and prints
//! its outcome.

use crate::cli::args::{
    AppendArgs, ApplyArgs, InsertAfterBlockArgs, InsertAfterHeadingArgs, SetFieldArgs, TagEditArgs,
};
use crate::cli::output::Output;
use crate::error::Result;
use crate::mutation::header::parse_value_arg;
use crate::mutation::{MatchPolicy, Mutation, Mutator};
use crate::vault::Vault;

fn policy(unique: bool) -> MatchPolicy {
    if unique {
        MatchPolicy::Unique
    } else {
        MatchPolicy::First
    }
}

fn apply(vault: &Vault, mutation: &Mutation, output: &Output) -> Result<()> {
    let outcome = Mutator::new(vault).apply(mutation)?;
    if !outcome.changed {
        output.info(&format!("{} already up to date", outcome.path.display()));
    }
    output.print(&outcome)
}

pub fn set_field(vault: &Vault, args: &SetFieldArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::SetHeaderField {
        path: vault.resolve_note(&args.note)?,
        key: args.key.clone(),
        value: parse_value_arg(&args.value),
    };
    apply(vault, &mutation, output)
}

pub fn add_tag(vault: &Vault, args: &TagEditArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::AddTag {
        path: vault.resolve_note(&args.note)?,
        tag: args.tag.clone(),
    };
    apply(vault, &mutation, output)
}

pub fn remove_tag(vault: &Vault, args: &TagEditArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::RemoveTag {
        path: vault.resolve_note(&args.note)?,
        tag: args.tag.clone(),
    };
    apply(vault, &mutation, output)
}

pub fn insert_after_heading(vault: &Vault, args: &InsertAfterHeadingArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::InsertAfterHeading {
        path: vault.resolve_note(&args.note)?,
        heading: args.heading.clone(),
        content: args.content.clone(),
        policy: policy(args.unique),
    };
    apply(vault, &mutation, output)
}

pub fn insert_after_block(vault: &Vault, args: &InsertAfterBlockArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::InsertAfterBlock {
        path: vault.resolve_note(&args.note)?,
        block_id: args.block.clone(),
        content: args.content.clone(),
        policy: policy(args.unique),
    };
    apply(vault, &mutation, output)
}

pub fn append(vault: &Vault, args: &AppendArgs, output: &Output) -> Result<()> {
    let mutation = Mutation::Append {
        path: vault.resolve_note(&args.note)?,
        content: args.content.clone(),
    };
    apply(vault, &mutation, output)
}

/// Apply a mutation given as JSON; its path is taken as vault-relative.
pub fn apply_json(vault: &Vault, args: &ApplyArgs, output: &Output) -> Result<()> {
    let mutation: Mutation = serde_json::from_str(&args.mutation)?;
    apply(vault, &mutation, output)
}
