// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams to the external update executor and the platform reboot.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use en_southbound::proto::UpdateMode;

/// What the executor left behind for verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorReport {
    /// Granular log contents; empty means the executor logged nothing.
    pub log: String,
    /// Kernel-only updates produce no package file.
    pub produced_package: bool,
}

/// The in-band update executor binary (external collaborator).
#[async_trait]
pub trait UpdateExecutor: Send + Sync {
    /// Pre-fetch the update payload into the local cache.
    async fn download(&self, cancel: &CancellationToken) -> Result<(), String>;

    /// Apply with the verbatim mode; returns the post-run report.
    async fn apply(
        &self,
        mode: UpdateMode,
        cancel: &CancellationToken,
    ) -> Result<ExecutorReport, String>;
}

/// Shells out to the `inbc` executor.
pub struct InbcExecutor {
    pub binary: String,
    /// Where the executor writes its granular log.
    pub log_path: PathBuf,
    /// Where the executor drops the downloaded package, if any.
    pub package_path: PathBuf,
}

impl Default for InbcExecutor {
    fn default() -> Self {
        Self {
            binary: "inbc".to_string(),
            log_path: PathBuf::from("/var/log/inbc-update.log"),
            package_path: PathBuf::from("/var/cache/edge-node/update.pkg"),
        }
    }
}

impl InbcExecutor {
    async fn run(&self, args: &[&str], cancel: &CancellationToken) -> Result<(), String> {
        let mut child = tokio::process::Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("spawn {}: {e}", self.binary))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| e.to_string())?;
                if status.success() {
                    Ok(())
                } else {
                    Err(format!("{} exited with {status}", self.binary))
                }
            }
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                Err("canceled".to_string())
            }
        }
    }

    fn mode_arg(mode: UpdateMode) -> &'static str {
        match mode {
            UpdateMode::Full => "sota",
            UpdateMode::NoDownload => "sota-no-download",
            UpdateMode::DownloadOnly => "sota-download-only",
        }
    }
}

#[async_trait]
impl UpdateExecutor for InbcExecutor {
    async fn download(&self, cancel: &CancellationToken) -> Result<(), String> {
        self.run(&[Self::mode_arg(UpdateMode::DownloadOnly)], cancel).await
    }

    async fn apply(
        &self,
        mode: UpdateMode,
        cancel: &CancellationToken,
    ) -> Result<ExecutorReport, String> {
        self.run(&[Self::mode_arg(mode)], cancel).await?;
        Ok(ExecutorReport {
            log: std::fs::read_to_string(&self.log_path).unwrap_or_default(),
            produced_package: self.package_path.exists(),
        })
    }
}

/// Platform reboot seam.
#[async_trait]
pub trait RebootHook: Send + Sync {
    async fn reboot(&self) -> Result<(), String>;
}

/// `systemctl reboot`, detached from this process's lifetime.
#[derive(Default, Clone)]
pub struct SystemdReboot;

#[async_trait]
impl RebootHook for SystemdReboot {
    async fn reboot(&self) -> Result<(), String> {
        debug!("issuing platform reboot");
        let status = tokio::process::Command::new("systemctl")
            .arg("reboot")
            .status()
            .await
            .map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            warn!(%status, "reboot request failed");
            Err(format!("systemctl reboot exited with {status}"))
        }
    }
}
