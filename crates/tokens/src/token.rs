// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-client token record and its expiry accounting.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use en_core::{token_expiry, JwtError};

/// Tokens are refreshed this many seconds before they expire.
pub const REFRESH_INTERVAL_SECS: i64 = 600;

/// Literal body the release service returns for unauthenticated access.
pub const ANONYMOUS_TOKEN: &str = "anonymous";

// The anonymous body carries no expiry; the synthetic ten-year horizon is a
// convention with the release service, not a contract.
const ANONYMOUS_TTL_DAYS: i64 = 3650;

/// One client's access token and its decoded expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientToken {
    pub client: String,
    pub access_token: String,
    pub expiry: DateTime<Utc>,
}

impl ClientToken {
    /// Build from a JWT body, decoding the unverified `exp` claim.
    pub fn from_jwt(client: &str, access_token: &str) -> Result<Self, JwtError> {
        let expiry = token_expiry(access_token)?;
        Ok(Self {
            client: client.to_string(),
            access_token: access_token.to_string(),
            expiry,
        })
    }

    /// The release service's `anonymous` body: valid, non-JWT, with a
    /// synthetic far-future expiry.
    pub fn anonymous(client: &str) -> Self {
        Self {
            client: client.to_string(),
            access_token: ANONYMOUS_TOKEN.to_string(),
            expiry: Utc::now() + Duration::days(ANONYMOUS_TTL_DAYS),
        }
    }

    /// Whether the refresher must replace this token now.
    pub fn is_refresh_required(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry - Duration::seconds(REFRESH_INTERVAL_SECS)
    }

    /// Whether the token may still be attached to outbound calls.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

/// Location of a client's persisted token under the token root.
pub(crate) fn token_path(base: &Path, client: &str) -> PathBuf {
    base.join(client).join("access_token")
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
