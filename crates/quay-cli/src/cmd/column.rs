//! `quay column add|rename|remove|list`.

use super::Ctx;
use crate::output::{column_row, pretty_section, render, render_mode};
use anyhow::Result;
use clap::{Args, Subcommand};
use quay_core::model::{Column, ColumnKey};
use quay_core::{Command, Effect, Outcome};
use serde::Serialize;
use std::io::Write;

#[derive(Subcommand, Debug)]
pub enum ColumnCommand {
    /// Append a column. The key is derived from the title ("Em Teste" -> em_teste).
    Add(AddArgs),
    /// Change a column's title. The key stays the same.
    Rename(RenameArgs),
    /// Remove an empty column.
    Remove(RemoveArgs),
    /// List columns with their card counts.
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Column title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Key of the column to rename.
    pub key: ColumnKey,
    /// New title.
    pub title: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Key of the column to remove.
    pub key: ColumnKey,
}

#[derive(Debug, Serialize)]
struct ColumnReport {
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<Effect>,
    columns: Vec<Column>,
}

#[derive(Debug, Serialize)]
struct ColumnEntry<'a> {
    key: &'a ColumnKey,
    title: &'a str,
    cards: usize,
}

pub fn run_column(command: &ColumnCommand, ctx: &Ctx) -> Result<()> {
    let command = match command {
        ColumnCommand::List => return run_list(ctx),
        ColumnCommand::Add(args) => Command::AddColumn {
            title: args.title.clone(),
        },
        ColumnCommand::Rename(args) => Command::RenameColumn {
            key: args.key.clone(),
            title: args.title.clone(),
        },
        ColumnCommand::Remove(args) => Command::RemoveColumn {
            key: args.key.clone(),
        },
    };

    let store = ctx.store()?;
    let report = store.transact(|controller| {
        let outcome = controller.dispatch(command)?;
        Ok(ColumnReport {
            changed: outcome.is_changed(),
            effect: match outcome {
                Outcome::Changed(effect) => Some(effect),
                Outcome::Unchanged => None,
            },
            columns: controller.board().columns().to_vec(),
        })
    })?;

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render(ctx.output, &report, |r, w| match &r.effect {
        Some(Effect::ColumnAdded { key }) => writeln!(w, "✓ Added column {key}"),
        Some(Effect::ColumnRetitled { key, title }) => {
            writeln!(w, "✓ Column {key} is now titled \"{title}\"")
        }
        Some(Effect::ColumnRemoved { key }) => writeln!(w, "✓ Removed column {key}"),
        _ => writeln!(w, "No change"),
    })
}

fn run_list(ctx: &Ctx) -> Result<()> {
    let board = ctx.store()?.load()?;
    let views = board.column_views();
    let entries: Vec<ColumnEntry<'_>> = views
        .views()
        .map(|view| ColumnEntry {
            key: &view.column.key,
            title: &view.column.title,
            cards: view.len(),
        })
        .collect();

    render_mode(
        ctx.output,
        &entries,
        |entries, w| {
            writeln!(w, "key\ttitle\tcards")?;
            for (entry, column) in entries.iter().zip(board.columns()) {
                column_row(w, column, entry.cards)?;
            }
            Ok(())
        },
        |entries, w| {
            pretty_section(w, "Columns")?;
            for entry in entries {
                writeln!(w, "  {:<16} {:<24} {:>3}", entry.key.as_str(), entry.title, entry.cards)?;
            }
            Ok(())
        },
    )
}
