// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for `ClusterOrchestratorSouthbound`.

use std::sync::Arc;

use tonic::metadata::MetadataValue;

use en_tokens::{clients, TokenStore};

use crate::channel::SouthboundEndpoint;
use crate::proto::{
    ActionRequest, ClusterStatusCode, RegisterClusterRequest, RegisterClusterResponse,
    UpdateClusterStatusRequest, UpdateClusterStatusResponse,
};
use crate::RpcError;

use super::{request_with_deadline, ServiceChannel};

const REGISTER_PATH: &str = "/cluster.orchestrator.southbound.v1.ClusterOrchestratorSouthbound/RegisterCluster";
const STATUS_PATH: &str = "/cluster.orchestrator.southbound.v1.ClusterOrchestratorSouthbound/UpdateClusterStatus";

// Orchestrator-side RBAC bypass keys on this metadata pair.
const CLIENT_KEY: &str = "client";
const CLIENT_VALUE: &str = "cluster-agent";

pub struct ClusterClient {
    channel: ServiceChannel,
    tokens: Arc<TokenStore>,
}

impl ClusterClient {
    pub fn new(endpoint: SouthboundEndpoint, tokens: Arc<TokenStore>) -> Self {
        Self { channel: ServiceChannel::new(endpoint), tokens }
    }

    /// Fetch the install/uninstall commands for this host.
    pub async fn register_cluster(
        &mut self,
        guid: &str,
    ) -> Result<RegisterClusterResponse, RpcError> {
        let mut request =
            request_with_deadline(RegisterClusterRequest { guid: guid.to_string() });
        self.authorize(&mut request)?;
        self.channel.unary(REGISTER_PATH, request).await
    }

    /// Report the machine state; the response carries the next action.
    pub async fn update_cluster_status(
        &mut self,
        guid: &str,
        code: ClusterStatusCode,
    ) -> Result<ActionRequest, RpcError> {
        let mut request = request_with_deadline(UpdateClusterStatusRequest {
            guid: guid.to_string(),
            code: code as i32,
        });
        self.authorize(&mut request)?;
        let response: UpdateClusterStatusResponse =
            self.channel.unary(STATUS_PATH, request).await?;
        Ok(response.action())
    }

    fn authorize<T>(&self, request: &mut tonic::Request<T>) -> Result<(), RpcError> {
        self.tokens.authorize(request, clients::CLUSTER_AGENT)?;
        request
            .metadata_mut()
            .insert(CLIENT_KEY, MetadataValue::from_static(CLIENT_VALUE));
        Ok(())
    }
}
