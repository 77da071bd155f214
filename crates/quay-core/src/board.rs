//! Canonical board state: the ordered column list and the full card collection.
//!
//! The board is the single owner of both. Callers read it through the
//! projection methods (`column_views`, `cards_in`, `orphaned_cards`) and mutate
//! it through the named operations below, which check every precondition
//! before touching state. A rejected operation leaves the board exactly as it
//! was.

use crate::error::ErrorCode;
use crate::model::{
    Attachment, Card, CardId, CardPatch, Column, ColumnKey, Comment, InvalidColumnKey, NewCard,
    StageRing, default_columns,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What `add_column` does when the derived key is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Refuse with [`BoardError::DuplicateColumn`].
    #[default]
    Reject,
    /// Replace the existing column's title in place.
    Overwrite,
}

/// Precondition failures for board operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("card {id} not found")]
    CardNotFound { id: CardId },

    #[error("column '{key}' not found")]
    ColumnNotFound { key: String },

    #[error("column '{key}' already exists")]
    DuplicateColumn { key: ColumnKey },

    #[error("column '{key}' still has {count} card(s)")]
    ColumnNotEmpty { key: ColumnKey, count: usize },

    #[error("{0}")]
    InvalidColumnKey(#[from] InvalidColumnKey),

    #[error("{field} must not be blank")]
    EmptyTitle { field: &'static str },

    #[error("board has no columns to place a card in")]
    NoColumns,

    #[error("card ids exhausted (next id {next})")]
    IdSpaceExhausted { next: u64 },
}

impl BoardError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CardNotFound { .. } => ErrorCode::CardNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::DuplicateColumn { .. } => ErrorCode::DuplicateColumn,
            Self::ColumnNotEmpty { .. } => ErrorCode::ColumnNotEmpty,
            Self::InvalidColumnKey(_) => ErrorCode::InvalidColumnKey,
            Self::EmptyTitle { .. } => ErrorCode::EmptyTitle,
            Self::NoColumns => ErrorCode::NoColumns,
            Self::IdSpaceExhausted { .. } => ErrorCode::InternalUnexpected,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// The observable change an operation made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    ColumnAdded { key: ColumnKey },
    ColumnRetitled { key: ColumnKey, title: String },
    ColumnRemoved { key: ColumnKey },
    CardCreated { id: CardId },
    CardUpdated { id: CardId },
    CardDeleted { id: CardId },
    CardMoved { id: CardId, from: ColumnKey, to: ColumnKey },
    CommentAdded { id: CardId },
    AttachmentAdded { id: CardId },
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Changed(Effect),
    /// Accepted but nothing needed to change (e.g. a drop on the card's own column).
    Unchanged,
}

impl Outcome {
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Read-only projection of one column and the cards whose status matches it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    pub column: &'a Column,
    all: &'a [Card],
    indices: &'a [usize],
}

impl<'a> ColumnView<'a> {
    pub fn cards(&self) -> impl Iterator<Item = &'a Card> + 'a {
        let all = self.all;
        self.indices.iter().map(move |&i| &all[i])
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Owned grouping that backs [`ColumnView`]s.
#[derive(Debug, Clone)]
pub struct ColumnViews<'a> {
    board: &'a Board,
    buckets: Vec<Vec<usize>>,
}

impl ColumnViews<'_> {
    pub fn views(&self) -> impl Iterator<Item = ColumnView<'_>> + '_ {
        self.board
            .columns
            .iter()
            .zip(&self.buckets)
            .map(|(column, indices)| ColumnView {
                column,
                all: &self.board.cards,
                indices,
            })
    }

    #[must_use]
    pub fn view(&self, index: usize) -> Option<ColumnView<'_>> {
        let column = self.board.columns.get(index)?;
        Some(ColumnView {
            column,
            all: &self.board.cards,
            indices: &self.buckets[index],
        })
    }
}

/// Columns and cards of one board.
///
/// Mutation goes through [`BoardController`](crate::BoardController); the
/// operations themselves are not part of the public API.
///
/// ```compile_fail
/// let mut board = quay_core::Board::default();
/// board.add_column("Fila", quay_core::DuplicatePolicy::Reject);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    columns: Vec<Column>,
    /// Kept sorted by id; ids are allocated increasingly.
    cards: Vec<Card>,
    next_id: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(default_columns())
    }
}

impl Board {
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            cards: Vec::new(),
            next_id: 1,
        }
    }

    /// Check the invariants a loaded board must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        let mut keys = HashSet::new();
        for column in &self.columns {
            if !keys.insert(&column.key) {
                return Err(format!("duplicate column key '{}'", column.key));
            }
        }
        let mut previous: Option<CardId> = None;
        for card in &self.cards {
            if previous.is_some_and(|p| p >= card.id) {
                return Err(format!("card ids out of order or repeated at {}", card.id));
            }
            if card.id.0 >= self.next_id {
                return Err(format!(
                    "card {} is not below the next id {}",
                    card.id, self.next_id
                ));
            }
            previous = Some(card.id);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn column(&self, key: &ColumnKey) -> Option<&Column> {
        self.columns.iter().find(|c| &c.key == key)
    }

    #[must_use]
    pub fn column_index(&self, key: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| &c.key == key)
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.position(id).map(|i| &self.cards[i])
    }

    pub fn cards_in<'a>(&'a self, key: &'a ColumnKey) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |card| &card.status == key)
    }

    /// Cards whose status names no column on this board.
    pub fn orphaned_cards(&self) -> impl Iterator<Item = &Card> + '_ {
        self.cards
            .iter()
            .filter(|card| self.column(&card.status).is_none())
    }

    /// Group every card under its column in one pass.
    #[must_use]
    pub fn column_views(&self) -> ColumnViews<'_> {
        let mut buckets = vec![Vec::new(); self.columns.len()];
        for (i, card) in self.cards.iter().enumerate() {
            if let Some(col) = self.column_index(&card.status) {
                buckets[col].push(i);
            }
        }
        ColumnViews {
            board: self,
            buckets,
        }
    }

    fn position(&self, id: CardId) -> Option<usize> {
        self.cards.binary_search_by_key(&id, |c| c.id).ok()
    }

    fn require_card(&self, id: CardId) -> Result<usize, BoardError> {
        self.position(id).ok_or(BoardError::CardNotFound { id })
    }

    fn require_column(&self, key: &ColumnKey) -> Result<usize, BoardError> {
        self.column_index(key)
            .ok_or_else(|| BoardError::ColumnNotFound {
                key: key.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Column operations
    // -----------------------------------------------------------------------

    /// Append a column whose key is derived from `title`.
    pub(crate) fn add_column(
        &mut self,
        title: &str,
        policy: DuplicatePolicy,
    ) -> Result<Outcome, BoardError> {
        let title = non_blank(title, "column title")?;
        let key = ColumnKey::from_title(title)?;

        if let Some(index) = self.column_index(&key) {
            return match policy {
                DuplicatePolicy::Reject => {
                    warn!(%key, "rejected duplicate column");
                    Err(BoardError::DuplicateColumn { key })
                }
                DuplicatePolicy::Overwrite => {
                    if self.columns[index].title == title {
                        return Ok(Outcome::Unchanged);
                    }
                    self.columns[index].title = title.to_string();
                    debug!(%key, "overwrote column title");
                    Ok(Outcome::Changed(Effect::ColumnRetitled {
                        key,
                        title: title.to_string(),
                    }))
                }
            };
        }

        self.columns.push(Column::new(key.clone(), title));
        debug!(%key, "added column");
        Ok(Outcome::Changed(Effect::ColumnAdded { key }))
    }

    /// Replace a column's title. The key never changes.
    pub(crate) fn rename_column(&mut self, key: &ColumnKey, title: &str) -> Result<Outcome, BoardError> {
        let index = self.require_column(key)?;
        let title = non_blank(title, "column title")?;
        if self.columns[index].title == title {
            return Ok(Outcome::Unchanged);
        }
        self.columns[index].title = title.to_string();
        debug!(%key, title, "renamed column");
        Ok(Outcome::Changed(Effect::ColumnRetitled {
            key: key.clone(),
            title: title.to_string(),
        }))
    }

    /// Remove an empty column.
    pub(crate) fn remove_column(&mut self, key: &ColumnKey) -> Result<Outcome, BoardError> {
        let index = self.require_column(key)?;
        let count = self.cards_in(key).count();
        if count > 0 {
            warn!(%key, count, "refused to remove non-empty column");
            return Err(BoardError::ColumnNotEmpty {
                key: key.clone(),
                count,
            });
        }
        self.columns.remove(index);
        debug!(%key, "removed column");
        Ok(Outcome::Changed(Effect::ColumnRemoved { key: key.clone() }))
    }

    // -----------------------------------------------------------------------
    // Card operations
    // -----------------------------------------------------------------------

    pub(crate) fn create_card(&mut self, new: NewCard, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        let client = non_blank(&new.client, "client")?.to_string();
        let service = non_blank(&new.service, "service")?.to_string();
        let status = match new.status {
            Some(key) => {
                self.require_column(&key)?;
                key
            }
            None => self
                .columns
                .first()
                .map(|c| c.key.clone())
                .ok_or(BoardError::NoColumns)?,
        };

        let id = CardId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or(BoardError::IdSpaceExhausted { next: self.next_id })?;
        self.next_id = next_id;
        self.cards.push(Card {
            id,
            status: status.clone(),
            client,
            service,
            description: new.description.filter(|d| !d.trim().is_empty()),
            urgency: new.urgency,
            requested_on: new.requested_on.unwrap_or_else(|| now.date_naive()),
            due_on: new.due_on,
            comments: Vec::new(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        debug!(%id, %status, "created card");
        Ok(Outcome::Changed(Effect::CardCreated { id }))
    }

    pub(crate) fn update_card(
        &mut self,
        id: CardId,
        patch: CardPatch,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        if let Some(status) = &patch.status {
            self.require_column(status)?;
        }
        let client = patch
            .client
            .as_deref()
            .map(|c| non_blank(c, "client").map(str::to_string))
            .transpose()?;
        let service = patch
            .service
            .as_deref()
            .map(|s| non_blank(s, "service").map(str::to_string))
            .transpose()?;

        let card = &mut self.cards[index];
        let before = card.clone();
        if let Some(client) = client {
            card.client = client;
        }
        if let Some(service) = service {
            card.service = service;
        }
        if let Some(description) = patch.description {
            card.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(urgency) = patch.urgency {
            card.urgency = urgency;
        }
        if let Some(requested_on) = patch.requested_on {
            card.requested_on = requested_on;
        }
        if let Some(due_on) = patch.due_on {
            card.due_on = due_on;
        }
        if let Some(status) = patch.status {
            card.status = status;
        }

        if *card == before {
            return Ok(Outcome::Unchanged);
        }
        card.updated_at = now;
        debug!(%id, "updated card");
        Ok(Outcome::Changed(Effect::CardUpdated { id }))
    }

    pub(crate) fn delete_card(&mut self, id: CardId) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        self.cards.remove(index);
        debug!(%id, "deleted card");
        Ok(Outcome::Changed(Effect::CardDeleted { id }))
    }

    pub(crate) fn add_comment(
        &mut self,
        id: CardId,
        author: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        let body = non_blank(body, "comment")?;
        let card = &mut self.cards[index];
        card.comments.push(Comment {
            author: author.to_string(),
            body: body.to_string(),
            at: now,
        });
        card.updated_at = now;
        Ok(Outcome::Changed(Effect::CommentAdded { id }))
    }

    pub(crate) fn add_attachment(
        &mut self,
        id: CardId,
        name: &str,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        let name = non_blank(name, "attachment name")?;
        let location = non_blank(location, "attachment location")?;
        let card = &mut self.cards[index];
        card.attachments.push(Attachment {
            name: name.to_string(),
            location: location.to_string(),
        });
        card.updated_at = now;
        Ok(Outcome::Changed(Effect::AttachmentAdded { id }))
    }

    /// Drop a card onto a column. Dropping on its own column changes nothing.
    pub(crate) fn move_card(
        &mut self,
        id: CardId,
        target: &ColumnKey,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        self.require_column(target)?;
        Ok(self.set_status(index, target.clone(), now))
    }

    /// Advance a card to the next stage of `ring`, wrapping at the end.
    pub(crate) fn advance_card(
        &mut self,
        id: CardId,
        ring: &StageRing,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let index = self.require_card(id)?;
        let next = ring.next_after(&self.cards[index].status).clone();
        if self.column(&next).is_none() {
            warn!(%id, stage = %next, "advanced onto a stage with no column");
        }
        Ok(self.set_status(index, next, now))
    }

    fn set_status(&mut self, index: usize, target: ColumnKey, now: DateTime<Utc>) -> Outcome {
        let card = &mut self.cards[index];
        if card.status == target {
            return Outcome::Unchanged;
        }
        let from = std::mem::replace(&mut card.status, target.clone());
        card.updated_at = now;
        debug!(id = %card.id, %from, to = %target, "moved card");
        Outcome::Changed(Effect::CardMoved {
            id: card.id,
            from,
            to: target,
        })
    }
}

fn non_blank<'a>(value: &'a str, field: &'static str) -> Result<&'a str, BoardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(BoardError::EmptyTitle { field })
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Urgency;
    use chrono::TimeZone;

    fn key(s: &str) -> ColumnKey {
        ColumnKey::parse(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn new_card(client: &str) -> NewCard {
        NewCard {
            client: client.to_string(),
            service: "Desova".to_string(),
            ..NewCard::default()
        }
    }

    fn created_id(outcome: Outcome) -> CardId {
        match outcome {
            Outcome::Changed(Effect::CardCreated { id }) => id,
            other => panic!("expected CardCreated, got {other:?}"),
        }
    }

    #[test]
    fn default_board_has_five_columns() {
        let board = Board::default();
        let keys: Vec<&str> = board.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            ["demandas", "em_analise", "aprovado", "em_execucao", "concluido"]
        );
        assert!(board.validate().is_ok());
    }

    #[test]
    fn new_card_lands_in_first_column() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("MSC"), now()).unwrap());
        let card = board.card(id).unwrap();
        assert_eq!(card.status, key("demandas"));
        assert_eq!(card.requested_on, now().date_naive());
        assert_eq!(card.urgency, Urgency::Normal);
    }

    #[test]
    fn card_ids_are_not_reused() {
        let mut board = Board::default();
        let a = created_id(board.create_card(new_card("A"), now()).unwrap());
        board.delete_card(a).unwrap();
        let b = created_id(board.create_card(new_card("B"), now()).unwrap());
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn create_rejects_unknown_status_and_blank_fields() {
        let mut board = Board::default();
        let mut card = new_card("A");
        card.status = Some(key("nowhere"));
        assert!(matches!(
            board.create_card(card, now()),
            Err(BoardError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            board.create_card(new_card("  "), now()),
            Err(BoardError::EmptyTitle { field: "client" })
        ));
        assert!(board.cards().is_empty());
    }

    #[test]
    fn create_at_last_id_fails_without_mutating() {
        let mut board = Board::default();
        board.next_id = u64::MAX;
        assert!(board.validate().is_ok());
        let before = board.clone();
        let err = board.create_card(new_card("A"), now()).unwrap_err();
        assert!(matches!(err, BoardError::IdSpaceExhausted { next: u64::MAX }));
        assert_eq!(err.code(), ErrorCode::InternalUnexpected);
        assert_eq!(board, before);

        board.next_id = u64::MAX - 1;
        let id = created_id(board.create_card(new_card("B"), now()).unwrap());
        assert_eq!(id, CardId(u64::MAX - 1));
        assert!(board.validate().is_ok());
    }

    #[test]
    fn create_without_columns_fails() {
        let mut board = Board::new(Vec::new());
        assert_eq!(
            board.create_card(new_card("A"), now()),
            Err(BoardError::NoColumns)
        );
    }

    #[test]
    fn drop_sets_status_to_target() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        let outcome = board.move_card(id, &key("aprovado"), now()).unwrap();
        assert_eq!(
            outcome,
            Outcome::Changed(Effect::CardMoved {
                id,
                from: key("demandas"),
                to: key("aprovado"),
            })
        );
        assert_eq!(board.card(id).unwrap().status, key("aprovado"));
    }

    #[test]
    fn drop_on_own_column_is_a_no_op() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        let before = board.clone();
        let later = now() + chrono::Duration::hours(1);
        assert_eq!(
            board.move_card(id, &key("demandas"), later).unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(board, before);
    }

    #[test]
    fn drop_on_unknown_column_is_rejected() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        assert!(matches!(
            board.move_card(id, &key("limbo"), now()),
            Err(BoardError::ColumnNotFound { .. })
        ));
        assert_eq!(board.card(id).unwrap().status, key("demandas"));
    }

    #[test]
    fn remove_non_empty_column_is_rejected() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        board.move_card(id, &key("aprovado"), now()).unwrap();
        let columns_before = board.columns().to_vec();

        let err = board.remove_column(&key("aprovado")).unwrap_err();
        assert_eq!(
            err,
            BoardError::ColumnNotEmpty {
                key: key("aprovado"),
                count: 1
            }
        );
        assert_eq!(err.code(), ErrorCode::ColumnNotEmpty);
        assert_eq!(board.columns(), columns_before.as_slice());
    }

    #[test]
    fn remove_empty_column_succeeds() {
        let mut board = Board::default();
        board.remove_column(&key("em_analise")).unwrap();
        assert_eq!(board.columns().len(), 4);
        assert!(board.column(&key("em_analise")).is_none());
    }

    #[test]
    fn add_column_derives_key() {
        let mut board = Board::default();
        let outcome = board.add_column("Em Teste", DuplicatePolicy::Reject).unwrap();
        assert_eq!(
            outcome,
            Outcome::Changed(Effect::ColumnAdded {
                key: key("em_teste")
            })
        );
        assert_eq!(board.columns().last().unwrap().title, "Em Teste");
    }

    #[test]
    fn duplicate_title_is_rejected_by_default() {
        let mut board = Board::default();
        board.add_column("Em Teste", DuplicatePolicy::Reject).unwrap();
        let err = board
            .add_column("em   teste", DuplicatePolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::DuplicateColumn {
                key: key("em_teste")
            }
        );
        assert_eq!(board.columns().len(), 6);
    }

    #[test]
    fn duplicate_title_overwrites_when_configured() {
        let mut board = Board::default();
        board.add_column("Em Teste", DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(
            board.add_column("Em Teste", DuplicatePolicy::Overwrite).unwrap(),
            Outcome::Unchanged
        );
        board.add_column("EM TESTE", DuplicatePolicy::Overwrite).unwrap();
        let matching: Vec<&Column> = board
            .columns()
            .iter()
            .filter(|c| c.key == key("em_teste"))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].title, "EM TESTE");
    }

    #[test]
    fn rename_keeps_key() {
        let mut board = Board::default();
        board.rename_column(&key("aprovado"), "Liberado").unwrap();
        let column = board.column(&key("aprovado")).unwrap();
        assert_eq!(column.title, "Liberado");
        assert!(matches!(
            board.rename_column(&key("aprovado"), " "),
            Err(BoardError::EmptyTitle { .. })
        ));
    }

    #[test]
    fn advance_wraps_last_stage_to_first() {
        let mut board = Board::default();
        let ring = StageRing::default();
        let mut card = new_card("A");
        card.status = Some(key("concluido"));
        let id = created_id(board.create_card(card, now()).unwrap());
        board.advance_card(id, &ring, now()).unwrap();
        assert_eq!(board.card(id).unwrap().status, key("demandas"));
    }

    #[test]
    fn advance_can_orphan_a_card() {
        let mut board = Board::default();
        let ring = StageRing::default();
        board.remove_column(&key("em_analise")).unwrap();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        board.advance_card(id, &ring, now()).unwrap();
        assert_eq!(board.card(id).unwrap().status, key("em_analise"));
        let orphans: Vec<CardId> = board.orphaned_cards().map(|c| c.id).collect();
        assert_eq!(orphans, vec![id]);
    }

    #[test]
    fn update_applies_patch_and_detects_no_change() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        let later = now() + chrono::Duration::minutes(5);

        let patch = CardPatch {
            urgency: Some(Urgency::Critical),
            description: Some(Some("Reefer, checar temperatura".into())),
            ..CardPatch::default()
        };
        assert!(board.update_card(id, patch.clone(), later).unwrap().is_changed());
        let card = board.card(id).unwrap();
        assert_eq!(card.urgency, Urgency::Critical);
        assert_eq!(card.updated_at, later);

        assert_eq!(board.update_card(id, patch, later).unwrap(), Outcome::Unchanged);

        let clear = CardPatch {
            description: Some(None),
            ..CardPatch::default()
        };
        board.update_card(id, clear, later).unwrap();
        assert!(board.card(id).unwrap().description.is_none());
    }

    #[test]
    fn update_rejects_unknown_status_without_partial_changes() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        let patch = CardPatch {
            client: Some("B".into()),
            status: Some(key("limbo")),
            ..CardPatch::default()
        };
        assert!(board.update_card(id, patch, now()).is_err());
        assert_eq!(board.card(id).unwrap().client, "A");
    }

    #[test]
    fn comments_and_attachments_keep_order() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        board.add_comment(id, "ana", "primeiro", now()).unwrap();
        board.add_comment(id, "rui", "segundo", now()).unwrap();
        board
            .add_attachment(id, "BL", "https://docs.example/bl.pdf", now())
            .unwrap();
        let card = board.card(id).unwrap();
        let bodies: Vec<&str> = card.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["primeiro", "segundo"]);
        assert_eq!(card.attachments[0].name, "BL");
        assert!(matches!(
            board.add_comment(id, "ana", "   ", now()),
            Err(BoardError::EmptyTitle { field: "comment" })
        ));
    }

    #[test]
    fn layout_groups_cards_by_column() {
        let mut board = Board::default();
        let a = created_id(board.create_card(new_card("A"), now()).unwrap());
        let b = created_id(board.create_card(new_card("B"), now()).unwrap());
        board.move_card(b, &key("aprovado"), now()).unwrap();

        let layout = board.column_views();
        let counts: Vec<usize> = layout.views().map(|v| v.len()).collect();
        assert_eq!(counts, [1, 0, 1, 0, 0]);
        let first: Vec<CardId> = layout.view(0).unwrap().cards().map(|c| c.id).collect();
        assert_eq!(first, vec![a]);
        assert!(layout.view(9).is_none());
    }

    #[test]
    fn validate_catches_duplicate_keys() {
        let board = Board::new(vec![
            Column::new(key("a"), "A"),
            Column::new(key("a"), "Again"),
        ]);
        assert!(board.validate().is_err());
    }

    #[test]
    fn board_json_roundtrip_preserves_state() {
        let mut board = Board::default();
        let id = created_id(board.create_card(new_card("A"), now()).unwrap());
        board.add_comment(id, "ana", "ok", now()).unwrap();
        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }
}
