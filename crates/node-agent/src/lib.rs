// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node agent / status aggregator.
//!
//! The one daemon per node that issues and rotates bearer tokens for every
//! local agent, hosts the readiness service on its UNIX socket, and
//! bridges the aggregated verdict upstream to the host manager.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod daemon;
mod exporter;
mod lock;

pub use exporter::{AggregateSink, HostmgrSink, StatusExporter};
pub use lock::{InstanceLock, LockError};
