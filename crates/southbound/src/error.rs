// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact error taxonomy for southbound calls.

use thiserror::Error;

/// Everything an agent needs to decide retry vs. refresh vs. log.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport down, deadline elapsed, or orchestrator half-closed.
    /// Retried by the caller's backoff; the channel redials on next use.
    #[error("orchestrator unavailable: {0}")]
    Unavailable(String),

    /// The bearer token was rejected; the token manager should
    /// force-refresh before the next retry.
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// No token available locally; surfaced without touching the wire.
    #[error(transparent)]
    Auth(#[from] en_tokens::AuthError),

    #[error("rpc failed: {0}")]
    Unknown(String),
}

impl RpcError {
    /// Whether the caller should ask the token manager for a forced
    /// refresh before retrying.
    pub fn wants_token_refresh(&self) -> bool {
        matches!(self, RpcError::Unauthenticated)
    }
}

impl From<tonic::Status> for RpcError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;
        match status.code() {
            Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
                RpcError::Unavailable(status.message().to_string())
            }
            Code::Unauthenticated | Code::PermissionDenied => RpcError::Unauthenticated,
            Code::InvalidArgument => RpcError::InvalidArgument(status.message().to_string()),
            Code::NotFound => RpcError::NotFound(status.message().to_string()),
            _ => RpcError::Unknown(format!("{}: {}", status.code(), status.message())),
        }
    }
}

impl From<tonic::transport::Error> for RpcError {
    fn from(err: tonic::transport::Error) -> Self {
        RpcError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
