// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock for the node agent.
//!
//! Two aggregators on one node would fight over the status socket and the
//! token files, so startup takes an exclusive flock on the PID file and
//! holds it for the life of the process.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another node agent holds the lock at {0}")]
    AlreadyRunning(PathBuf),

    #[error("failed to create lock file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Held for the process lifetime; the file is removed on drop.
pub struct InstanceLock {
    // NOTE(lifetime): held to maintain the exclusive flock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let wrap = |source| LockError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }

        let mut file =
            OpenOptions::new().create(true).truncate(false).write(true).open(path).map_err(wrap)?;
        file.try_lock_exclusive()
            .map_err(|_| LockError::AlreadyRunning(path.to_path_buf()))?;

        file.set_len(0).map_err(wrap)?;
        writeln!(file, "{}", std::process::id()).map_err(wrap)?;

        Ok(Self { file, path: path.to_path_buf() })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), %err, "failed to remove lock file");
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
