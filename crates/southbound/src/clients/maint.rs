// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for `MaintMgr`.

use std::sync::Arc;

use en_tokens::{clients, TokenStore};

use crate::channel::SouthboundEndpoint;
use crate::proto::{
    GetUpdateScheduleRequest, GetUpdateScheduleResponse, PlatformUpdateStatusRequest,
    PlatformUpdateStatusResponse, UpdateStatus,
};
use crate::RpcError;

use super::{request_with_deadline, ServiceChannel};

const SCHEDULE_PATH: &str = "/maintenance.manager.v1.MaintMgr/GetUpdateSchedule";
const STATUS_PATH: &str = "/maintenance.manager.v1.MaintMgr/PlatformUpdateStatus";

pub struct MaintClient {
    channel: ServiceChannel,
    tokens: Arc<TokenStore>,
}

impl MaintClient {
    pub fn new(endpoint: SouthboundEndpoint, tokens: Arc<TokenStore>) -> Self {
        Self { channel: ServiceChannel::new(endpoint), tokens }
    }

    /// Ask for the next maintenance window.
    pub async fn get_update_schedule(
        &mut self,
        guid: &str,
    ) -> Result<GetUpdateScheduleResponse, RpcError> {
        let mut request =
            request_with_deadline(GetUpdateScheduleRequest { guid: guid.to_string() });
        self.tokens.authorize(&mut request, clients::UPDATE_AGENT)?;
        self.channel.unary(SCHEDULE_PATH, request).await
    }

    /// Report update progress or verification outcome.
    pub async fn report_update_status(
        &mut self,
        guid: &str,
        status: UpdateStatus,
        detail: &str,
        source_version: &str,
    ) -> Result<(), RpcError> {
        let mut request = request_with_deadline(PlatformUpdateStatusRequest {
            guid: guid.to_string(),
            status: status as i32,
            detail: detail.to_string(),
            source_version: source_version.to_string(),
        });
        self.tokens.authorize(&mut request, clients::UPDATE_AGENT)?;
        let _: PlatformUpdateStatusResponse = self.channel.unary(STATUS_PATH, request).await?;
        Ok(())
    }
}
