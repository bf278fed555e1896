// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed southbound clients to the orchestration fabric.
//!
//! One long-lived channel per orchestrator service. Every wrapper attaches
//! the caller's bearer token, enforces the 5 s per-call deadline, and
//! translates transport failures into the compact error taxonomy agents
//! retry on. A half-closed orchestrator is never fatal: the channel is
//! rebuilt on the next call.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod channel;
mod clients;
mod error;
pub mod proto;

pub use channel::SouthboundEndpoint;
pub use clients::{ClusterClient, HostClient, MaintClient, TelemetryClient};
pub use error::RpcError;
