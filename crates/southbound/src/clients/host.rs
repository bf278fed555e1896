// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for `Hostmgr`.

use std::sync::Arc;

use en_tokens::TokenStore;

use crate::channel::SouthboundEndpoint;
use crate::proto::{
    InstanceState, InstanceStatus, SystemInfo, UpdateHostSystemInfoRequest,
    UpdateHostSystemInfoResponse, UpdateInstanceStateStatusRequest,
    UpdateInstanceStateStatusResponse,
};
use crate::RpcError;

use super::{request_with_deadline, ServiceChannel};

const SYSTEM_INFO_PATH: &str = "/host.manager.v1.Hostmgr/UpdateHostSystemInfoByGUID";
const INSTANCE_STATUS_PATH: &str = "/host.manager.v1.Hostmgr/UpdateInstanceStateStatusByHostGUID";

pub struct HostClient {
    channel: ServiceChannel,
    tokens: Arc<TokenStore>,
    /// Which local client's token signs these calls (hw-agent reports
    /// inventory, node-agent reports instance status).
    auth_client: &'static str,
}

impl HostClient {
    pub fn new(
        endpoint: SouthboundEndpoint,
        tokens: Arc<TokenStore>,
        auth_client: &'static str,
    ) -> Self {
        Self { channel: ServiceChannel::new(endpoint), tokens, auth_client }
    }

    /// Push the full hardware inventory in a single RPC.
    pub async fn update_host_system_info(
        &mut self,
        guid: &str,
        system_info: SystemInfo,
    ) -> Result<(), RpcError> {
        let mut request = request_with_deadline(UpdateHostSystemInfoRequest {
            guid: guid.to_string(),
            system_info: Some(system_info),
        });
        self.tokens.authorize(&mut request, self.auth_client)?;
        let _: UpdateHostSystemInfoResponse =
            self.channel.unary(SYSTEM_INFO_PATH, request).await?;
        Ok(())
    }

    /// Bridge the node-wide readiness aggregate upstream.
    pub async fn update_instance_state_status(
        &mut self,
        host_guid: &str,
        state: InstanceState,
        status: InstanceStatus,
        detail: &str,
    ) -> Result<(), RpcError> {
        let mut request = request_with_deadline(UpdateInstanceStateStatusRequest {
            host_guid: host_guid.to_string(),
            state: state as i32,
            status: status as i32,
            detail: detail.to_string(),
        });
        self.tokens.authorize(&mut request, self.auth_client)?;
        let _: UpdateInstanceStateStatusResponse =
            self.channel.unary(INSTANCE_STATUS_PATH, request).await?;
        Ok(())
    }
}
