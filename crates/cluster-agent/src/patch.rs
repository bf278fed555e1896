// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-OS patch hook that fires before uninstall.
//!
//! On Edge Microvisor Toolkit images the vendor uninstall script assumes a
//! mutable `/opt`; a targeted `sed` rewrites it first. Patch failure is
//! logged and ignored: the uninstall itself decides the outcome.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use en_core::read_to_string_no_symlink;

use crate::exec::run_shell;

const MICROVISOR_ID: &str = "Edge Microvisor Toolkit";

/// Locations involved in the pre-uninstall patch.
#[derive(Debug, Clone)]
pub struct MicrovisorPatch {
    pub os_release: PathBuf,
    /// Vendor uninstall script to patch in place.
    pub script: PathBuf,
}

impl Default for MicrovisorPatch {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
            script: PathBuf::from("/opt/rancher/rke2/bin/rke2-uninstall.sh"),
        }
    }
}

impl MicrovisorPatch {
    /// Whether the host image is the Edge Microvisor Toolkit.
    pub fn applies(&self) -> bool {
        match read_to_string_no_symlink(&self.os_release) {
            Ok(contents) => contents.contains(MICROVISOR_ID),
            Err(_) => false,
        }
    }

    fn sed_command(&self) -> String {
        format!(
            "sed -i 's|/usr/local|/opt/rke2|g' {}",
            self.script.display()
        )
    }

    /// Run the patch when it applies; never fatal.
    pub async fn apply(&self, cancel: &CancellationToken) {
        if !self.applies() {
            return;
        }
        if let Err(err) = run_shell("microvisor-patch", &self.sed_command(), cancel).await {
            warn!(%err, "uninstall script patch failed; continuing with uninstall");
        }
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
