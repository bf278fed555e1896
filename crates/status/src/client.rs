// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin agent-side handle to the status service.

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::UnixStream;

use en_wire::{decode, encode, read_message, write_message, AgentStatus, Request, Response};

use crate::StatusError;

/// Connects per call; the socket is local and the traffic tiny.
#[derive(Debug, Clone)]
pub struct StatusClient {
    path: PathBuf,
    agent: String,
}

impl StatusClient {
    pub fn new(path: impl Into<PathBuf>, agent: &str) -> Self {
        Self { path: path.into(), agent: agent.to_string() }
    }

    /// Report this agent's readiness. Idempotent on the service side.
    pub async fn report(&self, status: AgentStatus) -> Result<(), StatusError> {
        let request = Request::ReportStatus { agent: self.agent.clone(), status };
        match self.roundtrip(&request).await? {
            Response::Ok => Ok(()),
            Response::Error { message, .. } => Err(StatusError::Refused(message)),
            other => Err(StatusError::Refused(format!("unexpected response {other:?}"))),
        }
    }

    /// Fetch the report cadence the service wants agents to use.
    pub async fn status_interval(&self) -> Result<Duration, StatusError> {
        let request = Request::GetStatusInterval { agent: self.agent.clone() };
        match self.roundtrip(&request).await? {
            Response::Interval { seconds } => Ok(Duration::from_secs(seconds)),
            Response::Error { message, .. } => Err(StatusError::Refused(message)),
            other => Err(StatusError::Refused(format!("unexpected response {other:?}"))),
        }
    }

    async fn roundtrip(&self, request: &Request) -> Result<Response, StatusError> {
        match en_core::rpc_timeout(self.exchange(request)).await {
            Some(result) => result,
            None => Err(StatusError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "status service did not answer within the call deadline",
            ))),
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Response, StatusError> {
        let stream = UnixStream::connect(&self.path).await?;
        let (mut reader, mut writer) = stream.into_split();
        write_message(&mut writer, &encode(request)?).await?;
        let frame = read_message(&mut reader).await?;
        Ok(decode(&frame)?)
    }
}
