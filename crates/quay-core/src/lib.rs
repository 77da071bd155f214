//! quay-core: a Kanban board of service requests.
//!
//! # Conventions
//!
//! - **Mutation**: only through [`command::Command`]s applied by a
//!   [`command::BoardController`].
//! - **Errors**: `thiserror` enums carrying an [`error::ErrorCode`];
//!   `anyhow::Result` at the config boundary.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod board;
pub mod command;
pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod store;

pub use board::{Board, BoardError, ColumnView, ColumnViews, DuplicatePolicy, Effect, Outcome};
pub use command::{BoardController, Command};
pub use error::ErrorCode;
pub use store::{BoardStore, StoreError};
