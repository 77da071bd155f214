//! Named commands and the controller that applies them.
//!
//! Every board mutation goes through [`BoardController`]. Commands can be
//! applied immediately with [`BoardController::dispatch`] or queued with
//! [`BoardController::submit`] and drained in FIFO order by
//! [`BoardController::process_pending`].
//!
//! Moving a card is two-phase: `BeginMove` records which card is being
//! dragged, `CommitMove` drops it on a column and `CancelMove` abandons the
//! drag. The drag lives in the controller, never in the board.

use crate::board::{Board, BoardError, DuplicatePolicy, Outcome};
use crate::model::{CardId, CardPatch, ColumnKey, NewCard, StageRing};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddColumn { title: String },
    RenameColumn { key: ColumnKey, title: String },
    RemoveColumn { key: ColumnKey },
    CreateCard(NewCard),
    UpdateCard { id: CardId, patch: CardPatch },
    DeleteCard { id: CardId },
    AddComment { id: CardId, author: String, body: String },
    AddAttachment { id: CardId, name: String, location: String },
    AdvanceCard { id: CardId },
    BeginMove { id: CardId },
    CommitMove { target: ColumnKey },
    CancelMove,
}

impl Command {
    /// Short name for log lines.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddColumn { .. } => "add_column",
            Self::RenameColumn { .. } => "rename_column",
            Self::RemoveColumn { .. } => "remove_column",
            Self::CreateCard(_) => "create_card",
            Self::UpdateCard { .. } => "update_card",
            Self::DeleteCard { .. } => "delete_card",
            Self::AddComment { .. } => "add_comment",
            Self::AddAttachment { .. } => "add_attachment",
            Self::AdvanceCard { .. } => "advance_card",
            Self::BeginMove { .. } => "begin_move",
            Self::CommitMove { .. } => "commit_move",
            Self::CancelMove => "cancel_move",
        }
    }
}

/// Sole owner of a [`Board`] plus the transient state around it.
#[derive(Debug, Clone)]
pub struct BoardController {
    board: Board,
    ring: StageRing,
    policy: DuplicatePolicy,
    dragging: Option<CardId>,
    queue: VecDeque<Command>,
    revision: u64,
}

impl BoardController {
    #[must_use]
    pub const fn new(board: Board, ring: StageRing, policy: DuplicatePolicy) -> Self {
        Self {
            board,
            ring,
            policy,
            dragging: None,
            queue: VecDeque::new(),
            revision: 0,
        }
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn into_board(self) -> Board {
        self.board
    }

    #[must_use]
    pub const fn ring(&self) -> &StageRing {
        &self.ring
    }

    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Card currently being dragged, if any.
    #[must_use]
    pub const fn dragging(&self) -> Option<CardId> {
        self.dragging
    }

    /// Bumped once per applied command that changed the board.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue a command for the next [`process_pending`](Self::process_pending).
    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Drain the queue in submission order, stamping with the current time.
    pub fn process_pending(&mut self) -> Vec<Result<Outcome, BoardError>> {
        self.process_pending_at(Utc::now())
    }

    pub fn process_pending_at(&mut self, now: DateTime<Utc>) -> Vec<Result<Outcome, BoardError>> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(command) = self.queue.pop_front() {
            results.push(self.dispatch_at(command, now));
        }
        results
    }

    /// Apply one command immediately.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, BoardError> {
        self.dispatch_at(command, Utc::now())
    }

    pub fn dispatch_at(
        &mut self,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<Outcome, BoardError> {
        let name = command.name();
        let result = self.apply(command, now);
        match &result {
            Ok(outcome) => {
                if outcome.is_changed() {
                    self.revision += 1;
                }
                debug!(command = name, changed = outcome.is_changed(), revision = self.revision, "applied");
            }
            Err(err) => warn!(command = name, code = %err.code(), "rejected: {err}"),
        }
        result
    }

    fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<Outcome, BoardError> {
        match command {
            Command::AddColumn { title } => self.board.add_column(&title, self.policy),
            Command::RenameColumn { key, title } => self.board.rename_column(&key, &title),
            Command::RemoveColumn { key } => self.board.remove_column(&key),
            Command::CreateCard(new) => self.board.create_card(new, now),
            Command::UpdateCard { id, patch } => self.board.update_card(id, patch, now),
            Command::DeleteCard { id } => {
                let outcome = self.board.delete_card(id)?;
                if self.dragging == Some(id) {
                    self.dragging = None;
                }
                Ok(outcome)
            }
            Command::AddComment { id, author, body } => {
                self.board.add_comment(id, &author, &body, now)
            }
            Command::AddAttachment { id, name, location } => {
                self.board.add_attachment(id, &name, &location, now)
            }
            Command::AdvanceCard { id } => self.board.advance_card(id, &self.ring, now),
            Command::BeginMove { id } => {
                if self.board.card(id).is_none() {
                    return Err(BoardError::CardNotFound { id });
                }
                self.dragging = Some(id);
                Ok(Outcome::Unchanged)
            }
            Command::CommitMove { target } => match self.dragging.take() {
                Some(id) => self.board.move_card(id, &target, now),
                None => Ok(Outcome::Unchanged),
            },
            Command::CancelMove => {
                self.dragging = None;
                Ok(Outcome::Unchanged)
            }
        }
    }
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new(Board::default(), StageRing::default(), DuplicatePolicy::default())
    }
}
