//! Advisory locks around the board snapshot.
//!
//! Readers take a shared lock, load-modify-save transactions take an exclusive
//! one. Acquisition polls until the configured timeout so a second `quay`
//! process waits briefly instead of failing at once.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use tracing::trace;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock on {} not acquired after {waited:?}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("lock file I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::BoardWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct Held {
    file: File,
    path: PathBuf,
}

impl Held {
    fn acquire(path: &Path, timeout: Duration, mode: Mode) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            let attempt = match mode {
                Mode::Shared => FileExt::try_lock_shared(&file),
                Mode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if attempt.is_ok() {
                trace!(path = %path.display(), ?mode, "lock acquired");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Exclusive lock held for the duration of a board transaction.
#[derive(Debug)]
pub struct BoardWriteLock(Held);

impl BoardWriteLock {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Held::acquire(path, timeout, Mode::Exclusive).map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }
}

/// Shared lock held while reading the snapshot.
#[derive(Debug)]
pub struct BoardReadLock(Held);

impl BoardReadLock {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Held::acquire(path, timeout, Mode::Shared).map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    const SHORT: Duration = Duration::from_millis(20);
    const LONG: Duration = Duration::from_millis(200);

    #[test]
    fn write_lock_creates_parent_dirs() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/.quay/board.lock");
        let lock = BoardWriteLock::acquire(&path, LONG)?;
        assert_eq!(lock.path(), path.as_path());
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn second_writer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.lock");
        let _held = BoardWriteLock::acquire(&path, LONG).unwrap();
        let err = BoardWriteLock::acquire(&path, SHORT).unwrap_err();
        assert!(matches!(err, LockError::Timeout { path: ref p, .. } if p == &path));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }

    #[test]
    fn readers_share() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("board.lock");
        let _a = BoardReadLock::acquire(&path, LONG)?;
        let _b = BoardReadLock::acquire(&path, LONG)?;
        Ok(())
    }

    #[test]
    fn writer_blocks_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.lock");
        let _write = BoardWriteLock::acquire(&path, LONG).unwrap();
        let started = Instant::now();
        assert!(matches!(
            BoardReadLock::acquire(&path, SHORT),
            Err(LockError::Timeout { .. })
        ));
        assert!(started.elapsed() >= SHORT);
    }

    #[test]
    fn drop_releases() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("board.lock");
        drop(BoardWriteLock::acquire(&path, LONG)?);
        let _again = BoardWriteLock::acquire(&path, LONG)?;
        Ok(())
    }

    #[test]
    fn waiting_writer_proceeds_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.lock");
        let held = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let thread_path = path.clone();
        let (held_t, release_t) = (Arc::clone(&held), Arc::clone(&release));
        let handle = thread::spawn(move || {
            let _writer = BoardWriteLock::acquire(&thread_path, LONG).unwrap();
            held_t.wait();
            release_t.wait();
        });

        held.wait();
        assert!(BoardWriteLock::acquire(&path, SHORT).is_err());
        release.wait();
        handle.join().unwrap();
        assert!(BoardWriteLock::acquire(&path, LONG).is_ok());
    }
}
