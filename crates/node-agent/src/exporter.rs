// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate-to-orchestrator bridge.
//!
//! Every heartbeat the exporter folds agent reports, endpoint probes, and
//! unit checks into one verdict and pushes it to the host manager. The
//! aggregate is eventually consistent with a staleness bound of twice the
//! heartbeat.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use en_southbound::proto::{InstanceState, InstanceStatus};
use en_southbound::{HostClient, RpcError};
use en_status::{Aggregate, ProbeResults, ReadinessRegistry, UnitStates};
use en_tokens::{clients, ForceRefresh};
use en_wire::AgentStatus;

/// Where the aggregate goes. Seam for tests.
#[async_trait]
pub trait AggregateSink: Send + Sync {
    async fn push(&self, guid: &str, aggregate: Aggregate) -> Result<(), RpcError>;
}

/// Production sink over the host manager client.
pub struct HostmgrSink {
    client: AsyncMutex<HostClient>,
}

impl HostmgrSink {
    pub fn new(client: HostClient) -> Self {
        Self { client: AsyncMutex::new(client) }
    }
}

#[async_trait]
impl AggregateSink for HostmgrSink {
    async fn push(&self, guid: &str, aggregate: Aggregate) -> Result<(), RpcError> {
        let status = if aggregate.good() { InstanceStatus::Ok } else { InstanceStatus::Degraded };
        self.client
            .lock()
            .await
            .update_instance_state_status(
                guid,
                InstanceState::Running,
                status,
                &aggregate.summary(),
            )
            .await
    }
}

pub struct StatusExporter<S, U> {
    guid: String,
    sink: S,
    registry: Arc<ReadinessRegistry>,
    probes: Arc<ProbeResults>,
    units: Vec<String>,
    unit_states: U,
    /// Force-refresh hook fired on `Unauthenticated` pushes.
    refresher: Option<Arc<dyn ForceRefresh>>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<S: AggregateSink, U: UnitStates> StatusExporter<S, U> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guid: String,
        sink: S,
        registry: Arc<ReadinessRegistry>,
        probes: Arc<ProbeResults>,
        units: Vec<String>,
        unit_states: U,
        refresher: Option<Arc<dyn ForceRefresh>>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self { guid, sink, registry, probes, units, unit_states, refresher, interval, cancel }
    }

    /// One export pass; returns the aggregate for logging and tests.
    pub async fn export_once(&self) -> Aggregate {
        // The aggregator counts itself: a wedged export loop must read as
        // a missing component.
        if let Err(err) = self.registry.report("node-agent", AgentStatus::Ready) {
            debug!(%err, "self-report skipped");
        }

        let aggregate = Aggregate::compute(
            &self.registry,
            &self.probes,
            &self.units,
            &self.unit_states,
            Instant::now(),
        )
        .await;

        info!(summary = %aggregate.summary(), good = aggregate.good(), "node status");
        match self.sink.push(&self.guid, aggregate).await {
            Ok(()) => {}
            // Exactly one forced refresh before the retry.
            Err(err) if err.wants_token_refresh() => {
                if let Some(refresher) = &self.refresher {
                    if let Err(err) = refresher.force_refresh(clients::NODE_AGENT).await {
                        warn!(%err, "forced token refresh failed");
                    } else if let Err(err) = self.sink.push(&self.guid, aggregate).await {
                        warn!(%err, "instance status push failed after refresh");
                    }
                } else {
                    warn!(%err, "instance status push unauthenticated");
                }
            }
            Err(err) => warn!(%err, "instance status push failed"),
        }
        aggregate
    }

    /// Export on the heartbeat until cancellation.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("status exporter stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.export_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod tests;
