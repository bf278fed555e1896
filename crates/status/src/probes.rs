// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External readiness inputs: HTTP(S) endpoints and local units.
//!
//! The service itself polls a configured set of outbound endpoints (2xx
//! means ready) and asks the platform for unit activation state. Both feed
//! the same aggregate as agent reports.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hard ceiling on the endpoint poll cadence.
const MAX_NETWORK_INTERVAL: Duration = Duration::from_secs(60);

/// An outbound dependency polled over HTTP(S).
#[derive(Debug, Clone)]
pub struct NetworkEndpoint {
    pub name: String,
    pub url: String,
}

/// Latest probe outcomes, shared with the aggregator.
#[derive(Default)]
pub struct ProbeResults {
    ready: Mutex<HashMap<String, bool>>,
}

impl ProbeResults {
    pub fn set(&self, name: &str, ready: bool) {
        self.ready.lock().insert(name.to_string(), ready);
    }

    /// `(ready, total)` over all recorded probes.
    pub fn counts(&self) -> (usize, usize) {
        let ready = self.ready.lock();
        (ready.values().filter(|ok| **ok).count(), ready.len())
    }
}

/// Poll cadence: `min(6 × heartbeat, 60 s)`.
pub fn network_interval(heartbeat: Duration) -> Duration {
    (heartbeat * 6).min(MAX_NETWORK_INTERVAL)
}

/// Periodic HTTP(S) prober for the configured endpoints.
pub struct EndpointProber {
    http: reqwest::Client,
    endpoints: Vec<NetworkEndpoint>,
    results: Arc<ProbeResults>,
}

impl EndpointProber {
    pub fn new(
        endpoints: Vec<NetworkEndpoint>,
        results: Arc<ProbeResults>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(en_core::RPC_TIMEOUT).build()?;
        Ok(Self { http, endpoints, results })
    }

    /// One pass over every endpoint.
    pub async fn probe_all(&self) {
        for endpoint in &self.endpoints {
            let ready = match self.http.get(&endpoint.url).send().await {
                Ok(response) => response.status().is_success(),
                Err(err) => {
                    debug!(endpoint = %endpoint.name, %err, "endpoint probe failed");
                    false
                }
            };
            self.results.set(&endpoint.name, ready);
        }
    }

    /// Poll loop; exits when the root token cancels.
    pub async fn run(self, cancel: CancellationToken, heartbeat: Duration) {
        let mut ticker = tokio::time::interval(network_interval(heartbeat));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => self.probe_all().await,
            }
        }
    }
}

/// Platform seam for local unit activation state.
#[async_trait]
pub trait UnitStates: Send + Sync {
    async fn is_active(&self, unit: &str) -> bool;
}

/// Real implementation over `systemctl is-active`.
#[derive(Default, Clone)]
pub struct SystemdUnitStates;

#[async_trait]
impl UnitStates for SystemdUnitStates {
    async fn is_active(&self, unit: &str) -> bool {
        let result = tokio::process::Command::new("systemctl")
            .arg("is-active")
            .arg("--quiet")
            .arg(unit)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match result {
            Ok(status) => status.success(),
            Err(err) => {
                warn!(unit, %err, "unit state query failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "probes_tests.rs"]
mod tests;
