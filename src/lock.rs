// src/lock.rs

//! Host-wide instance lock.
//!
//! An advisory exclusive lock on a single file guarantees that at most one
//! backup run is active on the host. Acquisition never blocks: a second
//! instance sees [`LockAttempt::Busy`] and is expected to exit.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::errors::LockError;

/// Result of a non-blocking acquisition attempt.
#[derive(Debug)]
pub enum LockAttempt {
    Acquired(LockHandle),
    /// Another handle (in this or another process) holds the lock.
    Busy,
}

/// Exclusive ownership of the lock file.
///
/// The lock is released and the file closed when the handle is dropped.
#[derive(Debug)]
pub struct LockHandle {
    file: File,
    path: PathBuf,
}

impl LockHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!(lock = %self.path.display(), "instance lock released"),
            // Closing the file below releases the lock anyway.
            Err(e) => warn!(
                lock = %self.path.display(),
                error = %e,
                "failed to unlock instance lock explicitly"
            ),
        }
    }
}

/// Try to take the instance lock at `path` without waiting.
///
/// The file is created if missing and never truncated; its contents are
/// irrelevant. The parent directory must already exist.
pub fn try_acquire(path: &Path) -> Result<LockAttempt, LockError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            debug!(lock = %path.display(), "instance lock acquired");
            Ok(LockAttempt::Acquired(LockHandle {
                file,
                path: path.to_path_buf(),
            }))
        }
        Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(LockAttempt::Busy),
        Err(source) => Err(LockError::Lock {
            path: path.to_path_buf(),
            source,
        }),
    }
}
