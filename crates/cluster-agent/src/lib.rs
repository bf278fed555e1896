// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster lifecycle agent.
//!
//! Drives install/uninstall of the Kubernetes engine under orchestrator
//! command: a heartbeat poller reports the machine state upstream, the
//! returned action request feeds a six-state machine, and shell commands
//! run in killable child process groups.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod daemon;
mod exec;
mod machine;
mod patch;
mod poller;
mod state;

pub use exec::{run_shell, ExecError};
pub use machine::{ClusterError, ClusterMachine, Orchestrator, SouthboundOrchestrator};
pub use patch::MicrovisorPatch;
pub use poller::Poller;
pub use state::{transition, Action, ClusterState, Event};
