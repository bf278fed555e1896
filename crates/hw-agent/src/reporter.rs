// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inventory reporting pipeline.
//!
//! Device events and the periodic ticker multiplex into one
//! `send_status_update` job behind a shared retry wrapper. Success
//! timestamps feed the readiness job: the agent is `Ready` only while its
//! last successful push is fresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use async_trait::async_trait;

use en_core::{retry_with_cancel, RetryError};
use en_southbound::proto::SystemInfo;
use en_southbound::{HostClient, RpcError};
use en_status::StatusClient;
use en_tokens::{clients, ForceRefresh};
use en_wire::AgentStatus;

use crate::events::DeviceEventSource;
use crate::inventory::InventoryBuilder;

/// Retry cap for one status update.
const UPDATE_RETRIES: u32 = 3;

/// Where inventory payloads go. Seam for tests.
#[async_trait]
pub trait InventorySink: Send + Sync {
    async fn push(&self, guid: &str, info: SystemInfo) -> Result<(), RpcError>;
}

/// Production sink over the host manager client.
pub struct SouthboundSink {
    client: AsyncMutex<HostClient>,
}

impl SouthboundSink {
    pub fn new(client: HostClient) -> Self {
        Self { client: AsyncMutex::new(client) }
    }
}

#[async_trait]
impl InventorySink for SouthboundSink {
    async fn push(&self, guid: &str, info: SystemInfo) -> Result<(), RpcError> {
        self.client.lock().await.update_host_system_info(guid, info).await
    }
}

pub struct Reporter<S, B> {
    guid: String,
    sink: S,
    builder: B,
    /// Force-refresh hook fired on `Unauthenticated` pushes.
    refresher: Option<Arc<dyn ForceRefresh>>,
    update_interval: Duration,
    cancel: CancellationToken,
    last_success: Mutex<Option<Instant>>,
}

impl<S: InventorySink, B: InventoryBuilder> Reporter<S, B> {
    pub fn new(
        guid: String,
        sink: S,
        builder: B,
        refresher: Option<Arc<dyn ForceRefresh>>,
        update_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            guid,
            sink,
            builder,
            refresher,
            update_interval,
            cancel,
            last_success: Mutex::new(None),
        }
    }

    /// One push with a single forced token refresh before a single retry
    /// when the host manager rejects the bearer.
    async fn push_once(&self, info: SystemInfo) -> Result<(), RpcError> {
        match self.sink.push(&self.guid, info.clone()).await {
            Err(err) if err.wants_token_refresh() => {
                if let Some(refresher) = &self.refresher {
                    if let Err(err) = refresher.force_refresh(clients::HW_AGENT).await {
                        warn!(%err, "forced token refresh failed");
                    }
                }
                self.sink.push(&self.guid, info).await
            }
            other => other,
        }
    }

    /// Collect and push the inventory once, with the shared retry wrapper.
    /// Returns whether the push landed.
    pub async fn send_status_update(&self) -> bool {
        let info = self.builder.collect().await;

        let result = retry_with_cancel(&self.cancel, Some(UPDATE_RETRIES), || {
            let info = info.clone();
            async move { self.push_once(info).await }
        })
        .await;

        match result {
            Ok(()) => {
                *self.last_success.lock() = Some(Instant::now());
                debug!("inventory pushed");
                true
            }
            Err(RetryError::Canceled) => false,
            Err(RetryError::Exhausted(err)) => {
                warn!(%err, "inventory push failed");
                false
            }
        }
    }

    /// Whether the last successful push is fresh at `now`.
    pub fn is_fresh(&self, now: Instant, status_interval: Duration) -> bool {
        let window = 2 * status_interval.max(self.update_interval);
        self.last_success
            .lock()
            .is_some_and(|at| now.saturating_duration_since(at) <= window)
    }

    /// Main loop: ticker and device events fan into one job.
    pub async fn run<E: DeviceEventSource>(self: Arc<Self>, mut events: E) {
        let mut ticker = tokio::time::interval(self.update_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("inventory reporter stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.send_status_update().await;
                }
                event = events.next_event() => match event {
                    Some(event) => {
                        debug!(line = %event.line, "device change; pushing inventory");
                        self.send_status_update().await;
                    }
                    None => {
                        // Device stream gone (udevadm died); periodic
                        // reporting continues alone.
                        warn!("device event stream closed");
                        self.run_ticker_only(ticker).await;
                        return;
                    }
                },
            }
        }
    }

    async fn run_ticker_only(&self, mut ticker: tokio::time::Interval) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {
                    self.send_status_update().await;
                }
            }
        }
    }

    /// Readiness job: report freshness to the status service at its
    /// cadence.
    pub async fn report_readiness(self: Arc<Self>, status: StatusClient) {
        let interval = match status.status_interval().await {
            Ok(interval) => interval,
            Err(err) => {
                debug!(%err, "status interval unavailable; using update interval");
                self.update_interval
            }
        };
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {
                    let state = if self.is_fresh(Instant::now(), interval) {
                        AgentStatus::Ready
                    } else {
                        AgentStatus::NotReady
                    };
                    if let Err(err) = status.report(state).await {
                        debug!(%err, "readiness report failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
