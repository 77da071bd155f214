//! `quay advance <card>`: step a card to the next stage of the ring.

use super::card::mutate;
use super::Ctx;
use anyhow::Result;
use clap::Args;
use quay_core::Command;
use quay_core::model::CardId;

#[derive(Args, Debug)]
pub struct AdvanceArgs {
    /// Card to advance.
    pub card: CardId,
}

pub fn run_advance(args: &AdvanceArgs, ctx: &Ctx) -> Result<()> {
    mutate(ctx, args.card, Command::AdvanceCard { id: args.card })
}
