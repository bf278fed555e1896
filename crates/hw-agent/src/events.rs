// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device-event stream from the kernel.
//!
//! The production source tails `udevadm monitor` for block and net
//! subsystem events; each matching line becomes one change notification.
//! The seam exists so tests can inject events without hardware.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

/// One kernel device event, carried verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    pub line: String,
}

/// Source of device change notifications.
#[async_trait]
pub trait DeviceEventSource: Send {
    /// The next event, or `None` when the source is exhausted.
    async fn next_event(&mut self) -> Option<DeviceEvent>;
}

/// `udevadm monitor --udev --subsystem-match=block --subsystem-match=net`.
pub struct UdevMonitor {
    // Held so the monitor dies with the agent.
    _child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl UdevMonitor {
    pub fn spawn() -> std::io::Result<Self> {
        let mut child = Command::new("udevadm")
            .args(["monitor", "--udev", "--subsystem-match=block", "--subsystem-match=net"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::other("udevadm monitor spawned without stdout")
        })?;

        Ok(Self { _child: child, lines: BufReader::new(stdout).lines() })
    }
}

#[async_trait]
impl DeviceEventSource for UdevMonitor {
    async fn next_event(&mut self) -> Option<DeviceEvent> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    // udevadm prefixes event lines with "UDEV"; everything
                    // else is banner noise.
                    if line.starts_with("UDEV") {
                        debug!(%line, "device event");
                        return Some(DeviceEvent { line });
                    }
                }
                Ok(None) => return None,
                Err(err) => {
                    debug!(%err, "device monitor read failed");
                    return None;
                }
            }
        }
    }
}
