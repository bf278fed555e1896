// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local readiness service.
//!
//! A UNIX-socket RPC server collects per-agent readiness reports, probes
//! outbound endpoints and local units, and folds everything into one
//! node-wide verdict (`"K of N components running"`). Agents hold only a
//! thin client handle; all state lives behind the service's single writer
//! lock.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod aggregate;
mod client;
mod listener;
mod probes;
mod registry;

pub use aggregate::Aggregate;
pub use client::StatusClient;
pub use listener::StatusListener;
pub use probes::{
    EndpointProber, NetworkEndpoint, ProbeResults, SystemdUnitStates, UnitStates,
};
pub use registry::{ExpectedAgent, ReadinessRegistry};

use std::path::PathBuf;

use thiserror::Error;

/// Readiness service errors.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Agent name not on the expected-agents whitelist.
    #[error("unknown agent {0:?}")]
    UnknownAgent(String),

    /// Agent name failed validation (lowercase letters, digits, hyphens,
    /// at most 40 characters).
    #[error("invalid agent name {0:?}")]
    InvalidAgentName(String),

    /// Initial bind failure is fatal at boot.
    #[error("failed to bind status socket at {0}: {1}")]
    Bind(PathBuf, std::io::Error),

    #[error(transparent)]
    Protocol(#[from] en_wire::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered with an error frame.
    #[error("status service refused: {0}")]
    Refused(String),
}
