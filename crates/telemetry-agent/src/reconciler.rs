// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconcile loop: fetch, diff, apply.
//!
//! Failed writes keep their dirty bit pending so the next tick retries;
//! a tick with an unchanged profile set and nothing pending writes
//! nothing at all.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use en_southbound::proto::TelemetryProfile;
use en_southbound::{RpcError, TelemetryClient};
use en_status::StatusClient;
use en_tokens::{clients, ForceRefresh};
use en_wire::AgentStatus;

use crate::profile::{diff, GroupMask, ProfileSet};
use crate::render::Renderer;

/// Seam to the telemetry manager.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self, guid: &str) -> Result<Vec<TelemetryProfile>, RpcError>;
}

/// Production source over the southbound client.
pub struct SouthboundSource {
    client: AsyncMutex<TelemetryClient>,
}

impl SouthboundSource {
    pub fn new(client: TelemetryClient) -> Self {
        Self { client: AsyncMutex::new(client) }
    }
}

#[async_trait]
impl ConfigSource for SouthboundSource {
    async fn fetch(&self, guid: &str) -> Result<Vec<TelemetryProfile>, RpcError> {
        self.client.lock().await.get_telemetry_config(guid).await
    }
}

/// Applies a cluster config file as a ConfigMap via the platform CLI.
#[async_trait]
pub trait ClusterApply: Send + Sync {
    async fn apply(&self, path: &Path) -> Result<(), String>;
}

/// Shells out to the platform CLI (external collaborator).
pub struct CliConfigMapApply {
    /// Command template; `{path}` is replaced with the config file.
    pub command: String,
}

impl Default for CliConfigMapApply {
    fn default() -> Self {
        Self {
            command: "kubectl apply -f {path}".to_string(),
        }
    }
}

#[async_trait]
impl ClusterApply for CliConfigMapApply {
    async fn apply(&self, path: &Path) -> Result<(), String> {
        let command = self.command.replace("{path}", &path.display().to_string());
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .await
            .map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{command}: exit {}", status.code().unwrap_or(-1)))
        }
    }
}

pub struct Reconciler<S, A> {
    guid: String,
    source: S,
    cluster_apply: A,
    renderer: Renderer,
    /// Force-refresh hook fired on `Unauthenticated` fetches.
    refresher: Option<Arc<dyn ForceRefresh>>,
    interval: Duration,
    cancel: CancellationToken,
    applied: Mutex<ProfileSet>,
    /// Dirty bits whose writes failed; retried next tick.
    pending: Mutex<GroupMask>,
}

impl<S: ConfigSource, A: ClusterApply> Reconciler<S, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guid: String,
        source: S,
        cluster_apply: A,
        renderer: Renderer,
        refresher: Option<Arc<dyn ForceRefresh>>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            guid,
            source,
            cluster_apply,
            renderer,
            refresher,
            interval,
            cancel,
            applied: Mutex::new(ProfileSet::default()),
            pending: Mutex::new(GroupMask::default()),
        }
    }

    /// Fetch with one forced token refresh before a single retry when
    /// the telemetry manager rejects the bearer.
    async fn fetch_profiles(&self) -> Result<Vec<TelemetryProfile>, RpcError> {
        match self.source.fetch(&self.guid).await {
            Err(err) if err.wants_token_refresh() => {
                if let Some(refresher) = &self.refresher {
                    if let Err(err) =
                        refresher.force_refresh(clients::TELEMETRY_AGENT).await
                    {
                        warn!(%err, "forced token refresh failed");
                    }
                }
                self.source.fetch(&self.guid).await
            }
            other => other,
        }
    }

    /// One reconcile pass. Returns the mask of groups actually rewritten.
    pub async fn reconcile_once(&self) -> Result<GroupMask, RpcError> {
        let received = ProfileSet::from_wire(&self.fetch_profiles().await?);

        let (dirty, init) = {
            let applied = self.applied.lock();
            diff(&applied, &received)
        };
        let todo = dirty.union(*self.pending.lock());

        let mut written = GroupMask::default();
        let mut still_pending = GroupMask::default();

        for group in todo.groups() {
            let from_gold = init.is_set(group);
            match self.renderer.write(group, &received, from_gold) {
                Ok(path) => {
                    if group.is_cluster() {
                        if let Err(err) = self.cluster_apply.apply(&path).await {
                            warn!(?group, %err, "ConfigMap apply failed; will retry");
                            still_pending.set(group);
                            continue;
                        }
                    }
                    debug!(?group, path = %path.display(), "telemetry config applied");
                    written.set(group);
                }
                Err(err) => {
                    warn!(?group, %err, "config write failed; will retry");
                    still_pending.set(group);
                }
            }
        }

        *self.applied.lock() = received;
        *self.pending.lock() = still_pending;
        Ok(written)
    }

    /// Reconcile on the configured cadence until cancellation.
    pub async fn run(self, status: Option<StatusClient>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("telemetry reconciler stopping");
                    return;
                }
                _ = ticker.tick() => {
                    let healthy = match self.reconcile_once().await {
                        Ok(_) => self.pending.lock().is_empty(),
                        Err(err) => {
                            warn!(%err, "telemetry config fetch failed");
                            false
                        }
                    };
                    if let Some(status) = &status {
                        let state = if healthy {
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
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
