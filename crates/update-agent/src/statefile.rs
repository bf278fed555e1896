// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reboot-crossing state file.
//!
//! Written before the platform reboot and read on the next daemon start to
//! infer whether the update that caused the reboot succeeded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use en_core::{read_no_symlink, write_private, FileError};

/// Restart reason recorded for software-over-the-air updates.
pub const RESTART_REASON_SOTA: &str = "sota";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateFile {
    #[serde(rename = "restartReason")]
    pub restart_reason: String,
    #[serde(rename = "sourceVersion")]
    pub source_version: String,
}

impl UpdateStateFile {
    pub fn sota(source_version: &str) -> Self {
        Self {
            restart_reason: RESTART_REASON_SOTA.to_string(),
            source_version: source_version.to_string(),
        }
    }

    /// Persist before issuing the reboot.
    pub fn write(&self, path: &Path) -> Result<(), FileError> {
        let body = serde_json::to_vec(self).map_err(|e| FileError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        write_private(path, &body)
    }

    /// Read after reboot; `Ok(None)` when no update crossed the reboot.
    pub fn read(path: &Path) -> Result<Option<Self>, FileError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = read_no_symlink(path)?;
        serde_json::from_slice(&bytes).map(Some).map_err(|e| FileError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })
    }

    /// Consume the file once verification has reported upstream.
    pub fn remove(path: &Path) -> Result<(), FileError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(FileError::Write { path: path.to_path_buf(), source: err }),
        }
    }
}

#[cfg(test)]
#[path = "statefile_tests.rs"]
mod tests;
