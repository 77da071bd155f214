//! `quay drop <card> <column>`: the command-line form of a drag and drop.

use super::card::print_report;
use super::{CardReport, Ctx};
use anyhow::Result;
use clap::Args;
use quay_core::Command;
use quay_core::model::{CardId, ColumnKey};

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Card to move.
    pub card: CardId,
    /// Key of the target column.
    pub column: ColumnKey,
}

pub fn run_drop(args: &DropArgs, ctx: &Ctx) -> Result<()> {
    let id = args.card;
    let target = args.column.clone();
    let report = ctx.store()?.transact(|controller| {
        controller.dispatch(Command::BeginMove { id })?;
        let outcome = controller.dispatch(Command::CommitMove { target })?;
        Ok(CardReport::capture(controller, outcome, id))
    })?;
    print_report(ctx, &report)
}
