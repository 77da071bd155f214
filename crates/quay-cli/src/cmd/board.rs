//! `quay board`: every column with its cards, plus any orphaned cards.

use super::Ctx;
use crate::output::{CARD_HEADERS, card_line_pretty, card_row, pretty_section, render_mode};
use anyhow::Result;
use chrono::Local;
use quay_core::Board;
use quay_core::model::{Card, ColumnKey};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct ColumnSnapshot {
    pub key: ColumnKey,
    pub title: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct BoardSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphaned: Vec<Card>,
}

impl BoardSnapshot {
    pub fn of(board: &Board) -> Self {
        let views = board.column_views();
        Self {
            columns: views
                .views()
                .map(|view| ColumnSnapshot {
                    key: view.column.key.clone(),
                    title: view.column.title.clone(),
                    cards: view.cards().cloned().collect(),
                })
                .collect(),
            orphaned: board.orphaned_cards().cloned().collect(),
        }
    }
}

pub fn run_board(ctx: &Ctx) -> Result<()> {
    let board = ctx.store()?.load()?;
    let snapshot = BoardSnapshot::of(&board);
    render_mode(ctx.output, &snapshot, write_text, write_pretty)
}

fn write_text(snapshot: &BoardSnapshot, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}", CARD_HEADERS.join("\t"))?;
    for card in snapshot
        .columns
        .iter()
        .flat_map(|c| &c.cards)
        .chain(&snapshot.orphaned)
    {
        card_row(w, card)?;
    }
    Ok(())
}

fn write_pretty(snapshot: &BoardSnapshot, w: &mut dyn Write) -> std::io::Result<()> {
    let today = Local::now().date_naive();
    for column in &snapshot.columns {
        pretty_section(
            w,
            &format!("{} ({}) [{}]", column.title, column.cards.len(), column.key),
        )?;
        if column.cards.is_empty() {
            writeln!(w, "  (empty)")?;
        }
        for card in &column.cards {
            card_line_pretty(w, card, today)?;
        }
        writeln!(w)?;
    }
    if !snapshot.orphaned.is_empty() {
        pretty_section(w, "Orphaned (status names no column)")?;
        for card in &snapshot.orphaned {
            writeln!(w, "  #{} {} -> {}", card.id, card.headline(), card.status)?;
        }
    }
    Ok(())
}
