pub mod advance;
pub mod board;
pub mod card;
pub mod column;
pub mod completions;
pub mod drop;
pub mod init;

use crate::output::OutputMode;
use anyhow::Result;
use quay_core::model::{Card, CardId};
use quay_core::{BoardController, BoardStore, Effect, Outcome};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Per-invocation settings every handler needs.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub root: PathBuf,
    pub output: OutputMode,
    pub author: Option<String>,
    pub configured_author: Option<String>,
    pub quiet: bool,
}

impl Ctx {
    pub fn store(&self) -> Result<BoardStore> {
        Ok(BoardStore::discover(&self.root)?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// JSON shape of a mutation that touches one card.
#[derive(Debug, Serialize)]
pub struct CardReport {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
}

impl CardReport {
    pub fn capture(controller: &BoardController, outcome: Outcome, id: CardId) -> Self {
        let effect = match outcome {
            Outcome::Changed(effect) => Some(effect),
            Outcome::Unchanged => None,
        };
        Self {
            changed: effect.is_some(),
            effect,
            card: controller.board().card(id).cloned(),
        }
    }
}
