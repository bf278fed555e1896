// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for `TelemetryMgr`.

use std::sync::Arc;

use en_tokens::{clients, TokenStore};

use crate::channel::SouthboundEndpoint;
use crate::proto::{GetTelemetryConfigRequest, GetTelemetryConfigResponse, TelemetryProfile};
use crate::RpcError;

use super::{request_with_deadline, ServiceChannel};

const CONFIG_PATH: &str = "/telemetry.manager.v1.TelemetryMgr/GetTelemetryConfigByGUID";

pub struct TelemetryClient {
    channel: ServiceChannel,
    tokens: Arc<TokenStore>,
}

impl TelemetryClient {
    pub fn new(endpoint: SouthboundEndpoint, tokens: Arc<TokenStore>) -> Self {
        Self { channel: ServiceChannel::new(endpoint), tokens }
    }

    /// Fetch this node's desired telemetry profile set.
    pub async fn get_telemetry_config(
        &mut self,
        guid: &str,
    ) -> Result<Vec<TelemetryProfile>, RpcError> {
        let mut request =
            request_with_deadline(GetTelemetryConfigRequest { guid: guid.to_string() });
        self.tokens.authorize(&mut request, clients::TELEMETRY_AGENT)?;
        let response: GetTelemetryConfigResponse =
            self.channel.unary(CONFIG_PATH, request).await?;
        Ok(response.profiles)
    }
}
