// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responses from the status service.

use serde::{Deserialize, Serialize};

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    /// The agent name is not on the expected-agents whitelist.
    UnknownAgent,
    /// The agent name failed validation.
    InvalidArgument,
    /// Anything else; see the message.
    Internal,
}

/// Response from the status service to an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Answer to `GetStatusInterval`
    Interval { seconds: u64 },

    /// Error response
    Error { kind: ErrorKind, message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
