// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Common runtime shared by every edge-node agent.
//!
//! Retry/backoff composition, symlink-rejecting file access, TLS client
//! configuration, bearer-token expiry decoding, and config loading.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod jwt;
mod retry;
mod safefile;
mod shutdown;
mod tls;

pub use config::{AgentConfig, ConfigError, LogLevel, DEFAULT_INTERVAL};
pub use jwt::{token_expiry, JwtError};
pub use retry::{retry_with_cancel, rpc_timeout, RetryError, RPC_TIMEOUT};
pub use safefile::{
    read_no_symlink, read_to_string_no_symlink, write_private, FileError, SECRET_MODE,
};
pub use shutdown::{spawn_signal_listener, DRAIN_TIMEOUT};
pub use tls::{client_tls, TlsError, TlsSettings};

/// Mint the correlation id for one daemon run.
///
/// Logged once at startup and attached to error-path log lines so journal
/// output from concurrent agents can be split per run.
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
