// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests agents send to the status service.

use serde::{Deserialize, Serialize};

/// Readiness of a single agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AgentStatus {
    /// Registered but never reported.
    #[default]
    Unspecified,
    Ready,
    NotReady,
}

impl AgentStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, AgentStatus::Ready)
    }
}

/// Request from an agent to the status service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Record the sender's readiness. Idempotent.
    ReportStatus { agent: String, status: AgentStatus },

    /// Ask for the configured heartbeat interval so the sender can
    /// self-tune its report cadence.
    GetStatusInterval { agent: String },
}

impl Request {
    /// The agent name carried by any request variant.
    pub fn agent(&self) -> &str {
        match self {
            Request::ReportStatus { agent, .. } | Request::GetStatusInterval { agent } => agent,
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
