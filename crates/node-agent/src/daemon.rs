// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon wiring: lock, tokens, readiness service, exporter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use en_core::{spawn_signal_listener, AgentConfig, ConfigError, TlsSettings, DRAIN_TIMEOUT};
use en_metrics::{init_metrics, MetricsSettings};
use en_southbound::{HostClient, RpcError, SouthboundEndpoint};
use en_status::{
    EndpointProber, ExpectedAgent, NetworkEndpoint, ProbeResults, ReadinessRegistry,
    StatusError, StatusListener, SystemdUnitStates,
};
use en_tokens::{
    clients, AuthError, HttpIdentityProvider, IdpSettings, TokenRefresher, TokenStore,
};

use crate::exporter::{HostmgrSink, StatusExporter};
use crate::lock::{InstanceLock, LockError};

pub const COMPONENT: &str = "node-agent";

const DEFAULT_SOCKET: &str = "/run/node-agent/node-agent.sock";
const DEFAULT_LOCK: &str = "/run/node-agent/node-agent.pid";
const DEFAULT_CREDENTIALS: &str = "/etc/intel_edge_node/client-credentials";

/// Fatal-at-boot daemon errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Status(#[from] StatusError),
}

/// Identity-provider endpoint (`NODE_AGENT_IDP_URL` overrides).
fn idp_settings() -> IdpSettings {
    IdpSettings {
        idp_url: std::env::var("NODE_AGENT_IDP_URL")
            .unwrap_or_else(|_| "https://keycloak.kind.internal".to_string()),
        credentials_path: std::env::var("NODE_AGENT_CREDENTIALS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS)),
        release_service_url: std::env::var("NODE_AGENT_RELEASE_SERVICE_URL").ok(),
    }
}

/// Local units counted in the aggregate (`NODE_AGENT_UNITS`,
/// comma-separated).
fn outbound_units() -> Vec<String> {
    std::env::var("NODE_AGENT_UNITS")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn lock_path() -> PathBuf {
    std::env::var("NODE_AGENT_LOCK")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCK))
}

/// Every local client whose token this daemon rotates.
fn managed_clients() -> Vec<String> {
    vec![
        clients::NODE_AGENT.to_string(),
        clients::CLUSTER_AGENT.to_string(),
        clients::HW_AGENT.to_string(),
        clients::TELEMETRY_AGENT.to_string(),
        clients::UPDATE_AGENT.to_string(),
        clients::RELEASE_SERVICE.to_string(),
    ]
}

/// Agents expected to report on the status socket.
fn expected_agents(interval: Duration) -> Vec<ExpectedAgent> {
    vec![
        ExpectedAgent::named(COMPONENT),
        ExpectedAgent::named("cluster-agent"),
        ExpectedAgent::named("hw-agent"),
        ExpectedAgent::named("telemetry-agent"),
        ExpectedAgent::with_interval("update-agent", interval.max(Duration::from_secs(60))),
    ]
}

/// Install the fmt subscriber honoring the configured level.
pub fn init_tracing(config: &AgentConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the node agent until a termination signal.
pub async fn run(config: AgentConfig, tls: TlsSettings) -> Result<(), DaemonError> {
    let run_id = en_core::new_run_id();
    info!(run_id, version = %config.version, "starting node agent");

    let _lock = InstanceLock::acquire(&lock_path())?;

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    // Token manager: bootstrap every local client, refresh the stale ones
    // immediately, then rotate on the minute ticker.
    let tokens = Arc::new(TokenStore::new(&config.access_token_path));
    let client_names = managed_clients();
    let name_refs: Vec<&str> = client_names.iter().map(String::as_str).collect();
    let stale = tokens.bootstrap(&name_refs)?;

    let refresher = Arc::new(TokenRefresher::new(
        Arc::clone(&tokens),
        HttpIdentityProvider::new(idp_settings())?,
    ));
    if !stale.is_empty() {
        info!(?stale, "refreshing stale tokens at startup");
        refresher.refresh_due(&stale).await;
    }
    tokio::spawn(Arc::clone(&refresher).run(cancel.clone(), client_names));

    // Readiness service on the UNIX socket; bind failure is fatal.
    let registry =
        Arc::new(ReadinessRegistry::new(config.interval, &expected_agents(config.interval)));
    let socket = config
        .status_endpoint
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET));
    let listener = StatusListener::bind(&socket, Arc::clone(&registry))?;
    tokio::spawn(listener.run(cancel.clone()));
    info!(socket = %socket.display(), "readiness service listening");

    // Outbound endpoint probes feed the same aggregate.
    let probes = Arc::new(ProbeResults::default());
    let endpoints = vec![NetworkEndpoint {
        name: "orchestrator".to_string(),
        url: format!("https://{}", config.service_url),
    }];
    match EndpointProber::new(endpoints, Arc::clone(&probes)) {
        Ok(prober) => {
            tokio::spawn(prober.run(cancel.clone(), config.interval));
        }
        Err(err) => warn!(%err, "endpoint prober disabled"),
    }

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

    // Aggregate bridge to the host manager.
    let endpoint = SouthboundEndpoint::new(&config.service_url, &tls)?;
    let host = HostClient::new(endpoint, Arc::clone(&tokens), clients::NODE_AGENT);
    let exporter = StatusExporter::new(
        config.guid.clone(),
        HostmgrSink::new(host),
        registry,
        probes,
        outbound_units(),
        SystemdUnitStates,
        Some(refresher),
        config.interval,
        cancel.clone(),
    );
    exporter.run().await;

    // Bounded drain for in-flight work after cancellation.
    tokio::time::sleep(DRAIN_TIMEOUT).await;
    info!("node agent stopped");
    Ok(())
}
