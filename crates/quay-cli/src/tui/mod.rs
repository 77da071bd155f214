//! Terminal user interface for quay.
//!
//! ## Entry points
//!
//! - [`run_board_tui`]: the interactive board.
//!
//! The view applies edits to its own copy of the board for immediate
//! feedback and keeps the commands it applied. Those commands are replayed
//! against the snapshot on disk inside a store transaction, so writes made by
//! other `quay` processes while the board is open are kept.

pub mod board;

use crate::cmd::Ctx;
use anyhow::Result;
use board::{BoardView, Mode};
use crossterm::event::{self, Event, KeyEventKind};
use quay_core::{BoardStore, StoreError};
use std::time::Duration;
use tracing::{debug, warn};

/// How long to wait for a key before re-reading the board from disk.
const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Run the board until the user quits. Each change is written as it happens.
pub fn run_board_tui(ctx: &Ctx) -> Result<()> {
    let store = ctx.store()?;
    let mut view = BoardView::new(store.controller()?);

    let mut terminal = ratatui::init();
    let result = (|| -> Result<()> {
        while !view.should_quit() {
            terminal.draw(|frame| view.render(frame, frame.area()))?;
            let mut idle = true;
            if event::poll(REFRESH_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        view.handle_key(key);
                        idle = false;
                    }
                }
            }
            if view.has_unsaved() {
                if let Err(err) = sync(&store, &mut view) {
                    warn!(unsaved = view.unsaved().len(), "write failed: {err}");
                    view.set_status(format!("not saved, will retry: {err} ({})", err.code()));
                }
            } else if idle && view.mode() == &Mode::Normal {
                refresh(&store, &mut view);
            }
        }
        Ok(())
    })();
    ratatui::restore();
    result?;

    if view.has_unsaved() {
        sync(&store, &mut view)?;
    }
    Ok(())
}

/// Replay the view's unsaved commands against the board on disk, then show
/// the merged board. On failure the commands stay queued for the next call.
fn sync(store: &BoardStore, view: &mut BoardView) -> Result<(), StoreError> {
    let writes = view.unsaved().to_vec();
    let count = writes.len();
    let rejected = store.transact(|controller| {
        let mut rejected = Vec::new();
        for command in writes {
            if let Err(err) = controller.dispatch(command) {
                rejected.push(err);
            }
        }
        Ok(rejected)
    })?;
    view.mark_saved(count);
    debug!(count, rejected = rejected.len(), "replayed edits");

    view.reload(store.controller()?);
    if let Some(err) = rejected.first() {
        view.set_status(format!("not applied: {err} ({})", err.code()));
    }
    Ok(())
}

fn refresh(store: &BoardStore, view: &mut BoardView) {
    match store.controller() {
        Ok(controller) => {
            if controller.board() != view.controller().board() {
                view.reload(controller);
            }
        }
        Err(err) => warn!("reload failed: {err}"),
    }
}
