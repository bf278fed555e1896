// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symlink-rejecting file access for secrets, tokens, and configs.
//!
//! A symlink at any of these paths means something on the host substituted
//! the file under us, so every read checks `lstat` before opening. Writes of
//! secret material land with mode 0640 via a temp file + rename so readers
//! never observe a partial token.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Mode for persisted tokens and credentials: owner rw, group r.
pub const SECRET_MODE: u32 = 0o640;

/// File access errors.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("symlink rejected at {0}")]
    SymlinkRejected(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read a file's bytes, refusing to follow a symbolic link.
pub fn read_no_symlink(path: &Path) -> Result<Vec<u8>, FileError> {
    reject_symlink(path)?;
    fs::read(path).map_err(|source| FileError::Read { path: path.to_path_buf(), source })
}

/// Read a file as UTF-8, refusing to follow a symbolic link.
pub fn read_to_string_no_symlink(path: &Path) -> Result<String, FileError> {
    reject_symlink(path)?;
    fs::read_to_string(path).map_err(|source| FileError::Read { path: path.to_path_buf(), source })
}

/// Write secret material atomically with mode 0640.
///
/// Parent directories are created as needed. The destination itself must not
/// be a symlink; the rename replaces whatever regular file was there.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<(), FileError> {
    if path.exists() {
        reject_symlink(path)?;
    }
    let wrap = |source| FileError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let tmp = tmp_sibling(path);
    let mut file = fs::File::create(&tmp).map_err(wrap)?;
    file.set_permissions(fs::Permissions::from_mode(SECRET_MODE)).map_err(wrap)?;
    file.write_all(contents).map_err(wrap)?;
    file.sync_all().map_err(wrap)?;
    drop(file);

    fs::rename(&tmp, path).map_err(wrap)
}

fn reject_symlink(path: &Path) -> Result<(), FileError> {
    let meta = fs::symlink_metadata(path)
        .map_err(|source| FileError::Read { path: path.to_path_buf(), source })?;
    if meta.file_type().is_symlink() {
        return Err(FileError::SymlinkRejected(path.to_path_buf()));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "safefile_tests.rs"]
mod tests;
