// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring: config to running tasks.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use en_core::{spawn_signal_listener, AgentConfig, ConfigError, TlsSettings};
use en_metrics::{init_metrics, MetricsSettings};
use en_southbound::{MaintClient, RpcError, SouthboundEndpoint};
use en_status::StatusClient;
use en_tokens::{clients, AuthError, DiskRefresh, ForceRefresh, TokenStore};
use en_wire::AgentStatus;

use crate::executor::{InbcExecutor, SystemdReboot};
use crate::scheduler::{new_update_lock, Scheduler, SchedulerPaths, SouthboundMaint};

pub const COMPONENT: &str = "update-agent";

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

/// Run the platform update agent until a termination signal.
pub async fn run(config: AgentConfig, tls: TlsSettings) -> Result<(), DaemonError> {
    let run_id = en_core::new_run_id();
    info!(run_id, version = %config.version, "starting platform update agent");

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let tokens = Arc::new(TokenStore::new(&config.access_token_path));
    let stale = tokens.bootstrap(&[clients::UPDATE_AGENT])?;
    if !stale.is_empty() {
        warn!(?stale, "no current token at startup; waiting on the node agent refresher");
    }

    let endpoint = SouthboundEndpoint::new(&config.service_url, &tls)?;
    let client = MaintClient::new(endpoint, Arc::clone(&tokens));

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

    // The update agent's liveness is its tick loop; report Ready on the
    // service cadence while the scheduler task is alive.
    if let Some(path) = &config.status_endpoint {
        let status = StatusClient::new(path, COMPONENT);
        let cancel = cancel.clone();
        let interval = config.interval;
        tokio::spawn(async move {
            let cadence = status.status_interval().await.unwrap_or(interval);
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if let Err(err) = status.report(AgentStatus::Ready).await {
                            debug!(%err, "readiness report failed");
                        }
                    }
                }
            }
        });
    }

    let refresher: Arc<dyn ForceRefresh> = Arc::new(DiskRefresh::new(Arc::clone(&tokens)));
    let scheduler = Scheduler::new(
        config.guid.clone(),
        SouthboundMaint::new(client),
        InbcExecutor::default(),
        SystemdReboot,
        new_update_lock(),
        SchedulerPaths::default(),
        Some(refresher),
        config.interval,
        cancel,
    );
    scheduler.run().await;

    info!("platform update agent stopped");
    Ok(())
}
