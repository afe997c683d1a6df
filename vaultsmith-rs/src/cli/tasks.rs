//! Task-related CLI commands.

use crate::cli::args::{TasksArgs, ToggleTaskArgs};
use crate::cli::output::Output;
use crate::error::Result;
use crate::mutation::{Mutation, Mutator};
use crate::parser::parse_date_arg;
use crate::query::{TaskFilter, search_tasks};
use crate::stats::TaskStats;
use crate::vault::Vault;
use chrono::{Local, NaiveDate};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn date_arg(raw: Option<&str>, today: NaiveDate) -> Result<Option<NaiveDate>> {
    raw.map(|s| parse_date_arg(s, today)).transpose()
}

/// Translate command-line flags into a task filter.
pub fn filter_from_args(args: &TasksArgs, today: NaiveDate) -> Result<TaskFilter> {
    let has_recurrence = match (args.recurring, args.no_recurrence) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    Ok(TaskFilter {
        status: args.status.into(),
        priority: args.priority.map(Into::into),
        due_before: date_arg(args.due_before.as_deref(), today)?,
        due_after: date_arg(args.due_after.as_deref(), today)?,
        due_within_days: args.due_within,
        scheduled_before: date_arg(args.scheduled_before.as_deref(), today)?,
        scheduled_after: date_arg(args.scheduled_after.as_deref(), today)?,
        scheduled_within_days: args.scheduled_within,
        has_recurrence,
        tag: args.tag.clone(),
    })
}

pub fn tasks(vault: &Vault, args: &TasksArgs, output: &Output) -> Result<()> {
    let today = today();
    if args.stats {
        let stats = TaskStats::collect(vault, today)?;
        output.warnings(&stats.skipped);
        return output.print(&stats);
    }

    let filter = filter_from_args(args, today)?;
    let found = search_tasks(vault, &filter, args.sort.into(), args.desc, Some(args.limit), today)?;
    output.warnings(&found.skipped);
    if found.truncated {
        output.info(&format!("showing {} of {} tasks", found.tasks.len(), found.total));
    }
    output.print(&found)
}

pub fn toggle_task(vault: &Vault, args: &ToggleTaskArgs, output: &Output) -> Result<()> {
    let path = vault.resolve_note(&args.note)?;
    let done_date = date_arg(args.done_date.as_deref(), today())?;
    let outcome = Mutator::new(vault).apply(&Mutation::ToggleTask {
        path,
        line: args.line,
        done_date,
    })?;
    output.print(&outcome)
}
