// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring: config to running tasks.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use en_core::{spawn_signal_listener, AgentConfig, ConfigError, TlsSettings};
use en_metrics::{init_metrics, MetricsSettings};
use en_southbound::{ClusterClient, RpcError, SouthboundEndpoint};
use en_status::StatusClient;
use en_tokens::{clients, AuthError, DiskRefresh, ForceRefresh, TokenStore};

use crate::machine::{ClusterMachine, SouthboundOrchestrator};
use crate::patch::MicrovisorPatch;
use crate::poller::Poller;

pub const COMPONENT: &str = "cluster-agent";

/// Fatal-at-boot daemon errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// LVM cleanup shell run after a successful uninstall, when configured.
pub fn cleanup_cmd() -> Option<String> {
    std::env::var("CLUSTER_AGENT_LVM_CLEANUP").ok().filter(|cmd| !cmd.is_empty())
}

/// Install the fmt subscriber honoring the configured level; the
/// environment filter still wins when set.
pub fn init_tracing(config: &AgentConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the cluster agent until a termination signal.
pub async fn run(config: AgentConfig, tls: TlsSettings) -> Result<(), DaemonError> {
    let run_id = en_core::new_run_id();
    info!(run_id, version = %config.version, "starting cluster agent");

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let tokens = Arc::new(TokenStore::new(&config.access_token_path));
    let stale = tokens.bootstrap(&[clients::CLUSTER_AGENT])?;
    if !stale.is_empty() {
        // The node agent refreshes token files; we read through on use.
        warn!(?stale, "no current token at startup; waiting on the node agent refresher");
    }

    let endpoint = SouthboundEndpoint::new(&config.service_url, &tls)?;
    let client = ClusterClient::new(endpoint, Arc::clone(&tokens));
    let machine = Arc::new(ClusterMachine::new(
        config.guid.clone(),
        SouthboundOrchestrator::new(client),
        cleanup_cmd(),
        MicrovisorPatch::default(),
        cancel.clone(),
    ));

    let status = config
        .status_endpoint
        .as_ref()
        .map(|path| StatusClient::new(path, COMPONENT));

    let _metrics = config.metrics_endpoint.as_ref().and_then(|endpoint| {
        let settings = MetricsSettings {
            endpoint: endpoint.clone(),
            service_name: COMPONENT.to_string(),
            service_version: config.version.clone(),
            interval: config.metrics_interval,
        };
        match init_metrics(&settings) {
            Ok(guard) => Some(guard),
            Err(err) => {
                warn!(%err, "metrics disabled");
                None
            }
        }
    });

    let refresher: Arc<dyn ForceRefresh> = Arc::new(DiskRefresh::new(Arc::clone(&tokens)));
    Poller::new(machine, status, Some(refresher), config.interval, cancel).run().await;

    info!("cluster agent stopped");
    Ok(())
}
