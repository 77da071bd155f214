//! On-disk board directory (`.quay/`).
//!
//! ```text
//! .quay/
//!   board.json    versioned snapshot { "version": 1, "board": { ... } }
//!   config.toml   project configuration
//!   board.lock    advisory lock file
//! ```
//!
//! Snapshots are written to a temp file and renamed into place, so a reader
//! never sees a half-written board.

use crate::board::{Board, BoardError};
use crate::command::BoardController;
use crate::config::{self, ProjectConfig};
use crate::error::ErrorCode;
use crate::lock::{BoardReadLock, BoardWriteLock, LockError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const QUAY_DIR: &str = ".quay";
pub const BOARD_FILE: &str = "board.json";
pub const LOCK_FILE: &str = "board.lock";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no board found in {} or any parent directory", root.display())]
    NotInitialized { root: PathBuf },

    #[error("a board already exists at {}", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("corrupt board file {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Config(_) => ErrorCode::ConfigParseError,
            Self::Corrupt { .. } => ErrorCode::CorruptBoard,
            Self::Io { .. } => ErrorCode::BoardWriteFailed,
            Self::Lock(err) => err.code(),
            Self::Board(err) => err.code(),
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    board: Board,
}

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    board: &'a Board,
}

/// Handle to an initialized board directory.
#[derive(Debug, Clone)]
pub struct BoardStore {
    root: PathBuf,
    config: ProjectConfig,
}

impl BoardStore {
    /// Create `.quay/` under `root` with `config` and an empty board.
    ///
    /// An existing board is only replaced when `force` is set. An existing
    /// `config.toml` is kept unless `force` is set.
    pub fn init(root: &Path, config: &ProjectConfig, force: bool) -> Result<Self, StoreError> {
        let dir = root.join(QUAY_DIR);
        let board_path = dir.join(BOARD_FILE);
        if board_path.exists() && !force {
            return Err(StoreError::AlreadyInitialized { path: board_path });
        }
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let config_path = root.join(config::PROJECT_CONFIG_FILE);
        let config = if config_path.exists() && !force {
            config::load_project_config(root).map_err(StoreError::Config)?
        } else {
            config::write_project_config(root, config).map_err(StoreError::Config)?;
            config.clone()
        };

        let store = Self {
            root: root.to_path_buf(),
            config,
        };
        let _lock = store.write_lock()?;
        store.write_snapshot(&store.config.initial_board())?;
        info!(root = %root.display(), "initialized board");
        Ok(store)
    }

    /// Open the board in `start` or the nearest ancestor that has one.
    pub fn discover(start: &Path) -> Result<Self, StoreError> {
        let root = start
            .ancestors()
            .find(|dir| dir.join(QUAY_DIR).join(BOARD_FILE).is_file())
            .ok_or_else(|| StoreError::NotInitialized {
                root: start.to_path_buf(),
            })?;
        Self::open(root)
    }

    /// Open the board rooted exactly at `root`.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        if !root.join(QUAY_DIR).join(BOARD_FILE).is_file() {
            return Err(StoreError::NotInitialized {
                root: root.to_path_buf(),
            });
        }
        let config = config::load_project_config(root).map_err(StoreError::Config)?;
        debug!(root = %root.display(), "opened board");
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub fn board_path(&self) -> PathBuf {
        self.root.join(QUAY_DIR).join(BOARD_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(QUAY_DIR).join(LOCK_FILE)
    }

    fn write_lock(&self) -> Result<BoardWriteLock, StoreError> {
        Ok(BoardWriteLock::acquire(
            &self.lock_path(),
            self.config.lock.timeout(),
        )?)
    }

    /// Read the current snapshot under a shared lock.
    pub fn load(&self) -> Result<Board, StoreError> {
        let _lock = BoardReadLock::acquire(&self.lock_path(), self.config.lock.timeout())?;
        self.read_snapshot()
    }

    /// Controller over the current snapshot using the configured ring and policy.
    pub fn controller(&self) -> Result<BoardController, StoreError> {
        Ok(self.wrap(self.load()?))
    }

    /// Load, run `f`, and save if `f` changed the board. Holds the exclusive
    /// lock throughout so concurrent writers serialize.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut BoardController) -> Result<T, BoardError>,
    ) -> Result<T, StoreError> {
        let _lock = self.write_lock()?;
        let mut controller = self.wrap(self.read_snapshot()?);
        let value = f(&mut controller)?;
        if controller.revision() > 0 {
            self.write_snapshot(controller.board())?;
        } else {
            debug!("transaction made no changes; snapshot left as is");
        }
        Ok(value)
    }

    fn wrap(&self, board: Board) -> BoardController {
        BoardController::new(
            board,
            self.config.stages.ring.clone(),
            self.config.board.duplicate_columns,
        )
    }

    fn read_snapshot(&self) -> Result<Board, StoreError> {
        let path = self.board_path();
        let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Corrupt {
                path,
                detail: format!(
                    "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                    snapshot.version
                ),
            });
        }
        snapshot
            .board
            .validate()
            .map_err(|detail| StoreError::Corrupt {
                path: path.clone(),
                detail,
            })?;
        Ok(snapshot.board)
    }

    fn write_snapshot(&self, board: &Board) -> Result<(), StoreError> {
        let path = self.board_path();
        let tmp = path.with_extension("json.tmp");
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            board,
        };
        let mut bytes = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        bytes.push(b'\n');

        let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        info!(
            path = %path.display(),
            cards = board.cards().len(),
            columns = board.columns().len(),
            "saved board"
        );
        Ok(())
    }
}
