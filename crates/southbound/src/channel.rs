// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint construction for southbound channels.

use tonic::transport::{Channel, Endpoint};

use en_core::{client_tls, TlsSettings, RPC_TIMEOUT};

use crate::RpcError;

/// A resolved orchestrator endpoint from which channels are (re)built.
pub struct SouthboundEndpoint {
    endpoint: Endpoint,
}

impl SouthboundEndpoint {
    /// Build from the configured `host:port` and transport settings.
    pub fn new(service_url: &str, tls: &TlsSettings) -> Result<Self, RpcError> {
        let scheme = if tls.insecure { "http" } else { "https" };
        let uri = format!("{scheme}://{service_url}");

        let mut endpoint = Endpoint::from_shared(uri)
            .map_err(|e| RpcError::InvalidArgument(format!("service URL: {e}")))?
            .connect_timeout(RPC_TIMEOUT)
            .timeout(RPC_TIMEOUT)
            .tcp_nodelay(true);

        if let Some(tls_config) =
            client_tls(tls).map_err(|e| RpcError::Unknown(e.to_string()))?
        {
            endpoint = endpoint.tls_config(tls_config)?;
        }

        Ok(Self { endpoint })
    }

    /// A channel that dials on first use and redials after failures.
    pub fn channel(&self) -> Channel {
        self.endpoint.connect_lazy()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
