// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat poller: report state, apply the returned action.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use en_core::{retry_with_cancel, RetryError};
use en_southbound::proto::ActionRequest;
use en_southbound::RpcError;
use en_status::StatusClient;
use en_tokens::{clients, ForceRefresh};
use en_wire::AgentStatus;

use crate::machine::{ClusterError, ClusterMachine, Orchestrator};

/// Transport retries per poll; the tick period bounds the loop overall.
const POLL_RETRIES: u32 = 3;

pub struct Poller<O> {
    machine: Arc<ClusterMachine<O>>,
    status: Option<StatusClient>,
    /// Force-refresh hook fired on `Unauthenticated` responses.
    refresher: Option<Arc<dyn ForceRefresh>>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<O: Orchestrator> Poller<O> {
    pub fn new(
        machine: Arc<ClusterMachine<O>>,
        status: Option<StatusClient>,
        refresher: Option<Arc<dyn ForceRefresh>>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self { machine, status, refresher, interval, cancel }
    }

    /// Poll until the root token cancels.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("cluster poller stopping");
                    return;
                }
                _ = ticker.tick() => self.poll_once().await,
            }
        }
    }

    /// One heartbeat: `UpdateClusterStatus`, then dispatch the action.
    pub async fn poll_once(&self) {
        let code = self.machine.state().await.as_code();
        let guid = self.machine.guid().to_string();

        let action = retry_with_cancel(&self.cancel, Some(POLL_RETRIES), || {
            let guid = guid.clone();
            async move { self.update_status(&guid, code).await }
        })
        .await;

        match action {
            Ok(ActionRequest::None) => self.report(AgentStatus::Ready).await,
            Ok(action) => self.dispatch(action).await,
            Err(RetryError::Canceled) => {}
            Err(RetryError::Exhausted(err)) => {
                warn!(%err, "cluster status poll failed");
                self.report(AgentStatus::NotReady).await;
            }
        }
    }

    /// Status report with one forced token refresh before a single retry
    /// when the orchestrator rejects the bearer.
    async fn update_status(
        &self,
        guid: &str,
        code: en_southbound::proto::ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError> {
        match self.machine.orchestrator().update_cluster_status(guid, code).await {
            Err(err) if err.wants_token_refresh() => {
                self.refresh_token().await;
                self.machine.orchestrator().update_cluster_status(guid, code).await
            }
            other => other,
        }
    }

    async fn apply(&self, action: ActionRequest) -> Result<(), ClusterError> {
        match action {
            ActionRequest::Register => self.machine.register().await,
            ActionRequest::Deregister => self.machine.deregister().await,
            ActionRequest::None => Ok(()),
        }
    }

    async fn dispatch(&self, action: ActionRequest) {
        let result = match self.apply(action).await {
            // RegisterCluster under a rejected bearer: one refresh, one
            // retry of the whole action.
            Err(ClusterError::Rpc(err)) if err.wants_token_refresh() => {
                self.refresh_token().await;
                self.apply(action).await
            }
            other => other,
        };

        match result {
            Ok(()) => self.report(AgentStatus::Ready).await,
            // Incorrect actions are the orchestrator's race to lose; the
            // agent itself is healthy.
            Err(err @ ClusterError::IncorrectActionRequest { .. }) => {
                warn!(%err, "ignoring incorrect action request");
                self.report(AgentStatus::Ready).await;
            }
            Err(err) => {
                warn!(%err, "cluster action failed");
                self.report(AgentStatus::NotReady).await;
            }
        }
    }

    async fn refresh_token(&self) {
        let Some(refresher) = &self.refresher else { return };
        if let Err(err) = refresher.force_refresh(clients::CLUSTER_AGENT).await {
            warn!(%err, "forced token refresh failed");
        }
    }

    async fn report(&self, status: AgentStatus) {
        let Some(client) = &self.status else { return };
        if let Err(err) = client.report(status).await {
            debug!(%err, "readiness report failed");
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
