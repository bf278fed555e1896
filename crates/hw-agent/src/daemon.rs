// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring: config to running tasks.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use en_core::{spawn_signal_listener, AgentConfig, ConfigError, TlsSettings};
use en_metrics::{init_metrics, MetricsSettings};
use en_southbound::{HostClient, RpcError, SouthboundEndpoint};
use en_status::StatusClient;
use en_tokens::{clients, AuthError, DiskRefresh, ForceRefresh, TokenStore};

use crate::events::UdevMonitor;
use crate::inventory::SysinfoInventory;
use crate::reporter::{Reporter, SouthboundSink};

pub const COMPONENT: &str = "hw-agent";

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Install the fmt subscriber honoring the configured level.
pub fn init_tracing(config: &AgentConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the hardware discovery agent until a termination signal.
pub async fn run(config: AgentConfig, tls: TlsSettings) -> Result<(), DaemonError> {
    let run_id = en_core::new_run_id();
    info!(run_id, version = %config.version, "starting hardware discovery agent");

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let tokens = Arc::new(TokenStore::new(&config.access_token_path));
    let stale = tokens.bootstrap(&[clients::HW_AGENT])?;
    if !stale.is_empty() {
        warn!(?stale, "no current token at startup; waiting on the node agent refresher");
    }

    let endpoint = SouthboundEndpoint::new(&config.service_url, &tls)?;
    let client = HostClient::new(endpoint, Arc::clone(&tokens), clients::HW_AGENT);
    let refresher: Arc<dyn ForceRefresh> = Arc::new(DiskRefresh::new(Arc::clone(&tokens)));
    let reporter = Arc::new(Reporter::new(
        config.guid.clone(),
        SouthboundSink::new(client),
        SysinfoInventory,
        Some(refresher),
        config.interval,
        cancel.clone(),
    ));

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

    if let Some(path) = &config.status_endpoint {
        let status = StatusClient::new(path, COMPONENT);
        tokio::spawn(Arc::clone(&reporter).report_readiness(status));
    }

    match UdevMonitor::spawn() {
        Ok(events) => reporter.run(events).await,
        Err(err) => {
            // No kernel event stream (containers, stripped images): the
            // periodic ticker still reports.
            warn!(%err, "udev monitor unavailable; falling back to periodic reporting");
            reporter.run(NoEvents).await;
        }
    }

    info!("hardware discovery agent stopped");
    Ok(())
}

/// Event source that never fires.
struct NoEvents;

#[async_trait::async_trait]
impl crate::events::DeviceEventSource for NoEvents {
    async fn next_event(&mut self) -> Option<crate::events::DeviceEvent> {
        std::future::pending().await
    }
}
