//! Fixed stage ring used by a card's "advance" action.
//!
//! The ring is independent of the board's column set: advancing can land a
//! card on a stage whose column has since been removed.

use super::column::{Column, ColumnKey};
use serde::{Deserialize, Serialize};

/// Keys and titles of the five default stages, in workflow order.
pub const DEFAULT_STAGES: [(&str, &str); 5] = [
    ("demandas", "Demandas"),
    ("em_analise", "Em Análise"),
    ("aprovado", "Aprovado"),
    ("em_execucao", "Em Execução"),
    ("concluido", "Concluído"),
];

/// Ordered, non-empty list of status keys that wraps from last to first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnKey>", into = "Vec<ColumnKey>")]
pub struct StageRing(Vec<ColumnKey>);

/// Returned when a ring would be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyStageRing;

impl std::fmt::Display for EmptyStageRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("stage ring must contain at least one stage")
    }
}

impl std::error::Error for EmptyStageRing {}

impl StageRing {
    pub fn new(stages: Vec<ColumnKey>) -> Result<Self, EmptyStageRing> {
        if stages.is_empty() {
            return Err(EmptyStageRing);
        }
        Ok(Self(stages))
    }

    #[must_use]
    pub fn stages(&self) -> &[ColumnKey] {
        &self.0
    }

    #[must_use]
    pub fn first(&self) -> &ColumnKey {
        &self.0[0]
    }

    /// Stage after `current`. Unknown statuses start over at the first stage.
    #[must_use]
    pub fn next_after(&self, current: &ColumnKey) -> &ColumnKey {
        match self.0.iter().position(|stage| stage == current) {
            Some(index) => &self.0[(index + 1) % self.0.len()],
            None => self.first(),
        }
    }
}

impl Default for StageRing {
    fn default() -> Self {
        Self(
            DEFAULT_STAGES
                .iter()
                .map(|(key, _)| ColumnKey((*key).to_string()))
                .collect(),
        )
    }
}

impl TryFrom<Vec<ColumnKey>> for StageRing {
    type Error = EmptyStageRing;

    fn try_from(value: Vec<ColumnKey>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StageRing> for Vec<ColumnKey> {
    fn from(ring: StageRing) -> Self {
        ring.0
    }
}

/// The five default columns matching [`DEFAULT_STAGES`].
#[must_use]
pub fn default_columns() -> Vec<Column> {
    DEFAULT_STAGES
        .iter()
        .map(|(key, title)| Column::new(ColumnKey((*key).to_string()), *title))
        .collect()
}
