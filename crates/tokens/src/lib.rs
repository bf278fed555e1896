// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-client access-token lifecycle.
//!
//! The token manager owns one `ClientToken` per configured client name:
//! bootstrap from disk at startup, refresh against the identity provider
//! before expiry, persist with restrictive permissions, and attach as
//! bearer metadata to every outbound RPC. An identity-provider outage never
//! crashes the process; callers see `AuthError::Unavailable` and retry
//! under their own backoff.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod refresh;
mod store;
mod token;

pub use refresh::{
    DiskRefresh, ForceRefresh, HttpIdentityProvider, IdentityProvider, IdpSettings,
    TokenRefresher,
};
pub use store::TokenStore;
pub use token::{ClientToken, ANONYMOUS_TOKEN, REFRESH_INTERVAL_SECS};

use thiserror::Error;

/// Well-known client names on an edge node.
pub mod clients {
    pub const NODE_AGENT: &str = "node-agent";
    pub const CLUSTER_AGENT: &str = "cluster-agent";
    pub const HW_AGENT: &str = "hw-agent";
    pub const TELEMETRY_AGENT: &str = "telemetry-agent";
    pub const UPDATE_AGENT: &str = "update-agent";
    pub const RELEASE_SERVICE: &str = "release-service";
}

/// Token lifecycle errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No current token for the client; the caller should retry after the
    /// refresher has had a chance to run.
    #[error("auth unavailable for client {0:?}")]
    Unavailable(String),

    /// A persisted token has no decodable `exp` claim. Fatal at boot:
    /// every downstream component depends on expiry accounting.
    #[error("persisted token for client {0:?} carries no expiry")]
    MissingExpiry(String),

    /// The identity provider rejected or failed the exchange.
    #[error("identity provider: {0}")]
    Idp(String),

    /// A freshly issued token failed to decode; it is never persisted.
    #[error("token for client {0:?} failed to decode: {1}")]
    Decode(String, #[source] en_core::JwtError),

    #[error(transparent)]
    File(#[from] en_core::FileError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Idp(err.to_string())
    }
}
