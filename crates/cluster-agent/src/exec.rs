// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell execution with guaranteed kill-on-cancel.
//!
//! Install/uninstall commands come from the orchestrator as shell strings
//! and may fork helpers, so each run gets its own process group. On
//! cancellation the group receives SIGTERM, then SIGKILL after the wait
//! delay. Stdout and stderr are piped to the logger line by line.

use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Grace between SIGTERM and SIGKILL for a canceled child.
const WAIT_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {label}: {source}")]
    Spawn {
        label: String,
        source: std::io::Error,
    },

    #[error("{label} exited with status {code}")]
    CommandFailed { label: String, code: i32 },

    /// The child was killed because the owning task was canceled.
    #[error("{label} killed on cancellation")]
    Killed { label: String },
}

/// Run `command` through `sh -c` until exit or cancellation.
pub async fn run_shell(
    label: &str,
    command: &str,
    cancel: &CancellationToken,
) -> Result<(), ExecError> {
    debug!(label, command, "running shell command");

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::Spawn { label: label.to_string(), source })?;

    if let Some(stdout) = child.stdout.take() {
        spawn_line_logger(label.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_logger(label.to_string(), "stderr", stderr);
    }

    let group = child.id().map(|pid| Pid::from_raw(pid as i32));

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|source| ExecError::Spawn {
                label: label.to_string(),
                source,
            })?;
            if status.success() {
                Ok(())
            } else {
                Err(ExecError::CommandFailed {
                    label: label.to_string(),
                    code: status.code().unwrap_or(-1),
                })
            }
        }
        _ = cancel.cancelled() => {
            if let Some(group) = group {
                terminate_group(group).await;
            }
            // kill_on_drop covers the direct child if the group signal
            // raced with exit.
            let _ = child.wait().await;
            Err(ExecError::Killed { label: label.to_string() })
        }
    }
}

/// SIGTERM the group, wait the grace period, SIGKILL what remains.
async fn terminate_group(group: Pid) {
    if let Err(err) = killpg(group, Signal::SIGTERM) {
        debug!(%group, %err, "SIGTERM to process group failed");
        return;
    }
    tokio::time::sleep(WAIT_DELAY).await;
    match killpg(group, Signal::SIGKILL) {
        // ESRCH means the group exited within the grace period.
        Err(nix::errno::Errno::ESRCH) | Ok(()) => {}
        Err(err) => warn!(%group, %err, "SIGKILL to process group failed"),
    }
}

fn spawn_line_logger<R>(label: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(label = %label, stream, "{line}");
        }
    });
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
