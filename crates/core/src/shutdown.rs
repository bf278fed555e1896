// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root cancellation wiring for daemon processes.
//!
//! SIGINT and SIGTERM cancel the root token; every task selects on it and
//! must exit within the bounded grace period. SIGHUP is reserved.

use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Grace period for in-flight RPCs after cancellation.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Spawn the task that cancels `root` on SIGINT/SIGTERM.
pub fn spawn_signal_listener(root: CancellationToken) {
    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "failed to install SIGINT handler");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
        root.cancel();
    });
}
