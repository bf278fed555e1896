// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring: config to running tasks.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use en_core::{spawn_signal_listener, AgentConfig, ConfigError, TlsSettings};
use en_metrics::{init_metrics, MetricsSettings};
use en_southbound::{RpcError, SouthboundEndpoint, TelemetryClient};
use en_status::StatusClient;
use en_tokens::{clients, AuthError, DiskRefresh, ForceRefresh, TokenStore};

use crate::reconciler::{CliConfigMapApply, Reconciler, SouthboundSource};
use crate::render::Renderer;

pub const COMPONENT: &str = "telemetry-agent";

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Host collector config directory (`TELEMETRY_HOST_DIR` overrides).
pub fn host_dir() -> PathBuf {
    std::env::var("TELEMETRY_HOST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/edge-node/telemetry/host"))
}

/// Cluster collector config directory (`TELEMETRY_CLUSTER_DIR` overrides).
pub fn cluster_dir() -> PathBuf {
    std::env::var("TELEMETRY_CLUSTER_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/edge-node/telemetry/cluster"))
}

/// Install the fmt subscriber honoring the configured level.
pub fn init_tracing(config: &AgentConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the telemetry agent until a termination signal.
pub async fn run(config: AgentConfig, tls: TlsSettings) -> Result<(), DaemonError> {
    let run_id = en_core::new_run_id();
    info!(run_id, version = %config.version, "starting platform telemetry agent");

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let tokens = Arc::new(TokenStore::new(&config.access_token_path));
    let stale = tokens.bootstrap(&[clients::TELEMETRY_AGENT])?;
    if !stale.is_empty() {
        warn!(?stale, "no current token at startup; waiting on the node agent refresher");
    }

    let endpoint = SouthboundEndpoint::new(&config.service_url, &tls)?;
    let client = TelemetryClient::new(endpoint, Arc::clone(&tokens));

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

    let status = config
        .status_endpoint
        .as_ref()
        .map(|path| StatusClient::new(path, COMPONENT));

    let refresher: Arc<dyn ForceRefresh> = Arc::new(DiskRefresh::new(Arc::clone(&tokens)));
    let reconciler = Reconciler::new(
        config.guid.clone(),
        SouthboundSource::new(client),
        CliConfigMapApply::default(),
        Renderer::new(host_dir(), cluster_dir()),
        Some(refresher),
        config.interval,
        cancel,
    );
    reconciler.run(status).await;

    info!("platform telemetry agent stopped");
    Ok(())
}
