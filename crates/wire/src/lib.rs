// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the local status service.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod wire;

pub use request::{AgentStatus, Request};
pub use response::{ErrorKind, Response};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME_LEN};

#[cfg(test)]
mod property_tests;
