// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One typed client per orchestrator service.
//!
//! All clients share the `ServiceChannel` plumbing: ready-check, prost
//! codec, 5 s deadline, taxonomy mapping, and channel replacement after a
//! fatal transport failure so the next tick dials fresh.

mod cluster;
mod host;
mod maint;
mod telemetry;

pub use cluster::ClusterClient;
pub use host::HostClient;
pub use maint::MaintClient;
pub use telemetry::TelemetryClient;

use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use en_core::RPC_TIMEOUT;

use crate::channel::SouthboundEndpoint;
use crate::RpcError;

/// Long-lived connection to one service, rebuilt on fatal failure.
pub(crate) struct ServiceChannel {
    endpoint: SouthboundEndpoint,
    grpc: Grpc<Channel>,
}

impl ServiceChannel {
    pub(crate) fn new(endpoint: SouthboundEndpoint) -> Self {
        let grpc = Grpc::new(endpoint.channel());
        Self { endpoint, grpc }
    }

    /// Issue one unary call, mapping failures into the compact taxonomy.
    pub(crate) async fn unary<Req, Resp>(
        &mut self,
        path: &'static str,
        request: tonic::Request<Req>,
    ) -> Result<Resp, RpcError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        if let Err(err) = self.grpc.ready().await {
            self.reset();
            return Err(RpcError::Unavailable(err.to_string()));
        }

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        match self.grpc.unary(request, PathAndQuery::from_static(path), codec).await {
            Ok(response) => Ok(response.into_inner()),
            Err(status) => {
                let err = RpcError::from(status);
                if matches!(err, RpcError::Unavailable(_)) {
                    // Half-closed orchestrator: drop the connection and
                    // redial on the next call rather than treating it as
                    // fatal.
                    self.reset();
                }
                Err(err)
            }
        }
    }

    fn reset(&mut self) {
        self.grpc = Grpc::new(self.endpoint.channel());
    }
}

/// New request carrying the standard per-call deadline.
pub(crate) fn request_with_deadline<T>(message: T) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(RPC_TIMEOUT);
    request
}
