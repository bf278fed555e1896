// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory token store backed by per-client files.
//!
//! Single-writer-many-readers map: the refresher replaces entries, every
//! outbound RPC reads them. Persisted files live at
//! `<base>/<client>/access_token` with mode 0640 and are never written with
//! an undecodable expiry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tonic::metadata::MetadataValue;
use tracing::{debug, warn};

use en_core::{read_to_string_no_symlink, write_private, JwtError};

use crate::token::{token_path, ClientToken, ANONYMOUS_TOKEN};
use crate::AuthError;

/// Metadata key carrying the bearer token.
pub const AUTHORIZATION_KEY: &str = "authorization";

pub struct TokenStore {
    base: PathBuf,
    tokens: RwLock<HashMap<String, ClientToken>>,
}

impl TokenStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), tokens: RwLock::new(HashMap::new()) }
    }

    /// Load persisted tokens for `clients` and return the subset needing an
    /// immediate refresh (missing, unreadable, or already stale).
    ///
    /// A persisted token that parses as a JWT but carries no `exp` claim is
    /// a hard error: the caller is expected to exit non-zero.
    pub fn bootstrap(&self, clients: &[&str]) -> Result<Vec<String>, AuthError> {
        let mut stale = Vec::new();
        let now = Utc::now();

        for &client in clients {
            match self.load_persisted(client) {
                Ok(token) => {
                    let refresh = token.is_refresh_required(now);
                    if refresh {
                        stale.push(client.to_string());
                    }
                    self.tokens.write().insert(client.to_string(), token);
                }
                Err(AuthError::MissingExpiry(client)) => {
                    return Err(AuthError::MissingExpiry(client));
                }
                Err(err) => {
                    debug!(client, %err, "no usable persisted token; scheduling refresh");
                    stale.push(client.to_string());
                }
            }
        }

        Ok(stale)
    }

    fn load_persisted(&self, client: &str) -> Result<ClientToken, AuthError> {
        let path = token_path(&self.base, client);
        let body = read_to_string_no_symlink(&path)?;
        let body = body.trim();

        if body == ANONYMOUS_TOKEN {
            return Ok(ClientToken::anonymous(client));
        }
        match ClientToken::from_jwt(client, body) {
            Ok(token) => Ok(token),
            // Expiry accounting is load-bearing for every downstream
            // component, so an exp-less persisted token is fatal.
            Err(JwtError::MissingExpiry) => Err(AuthError::MissingExpiry(client.to_string())),
            Err(err) => Err(AuthError::Decode(client.to_string(), err)),
        }
    }

    /// Persist and publish a freshly acquired token.
    pub fn put(&self, token: ClientToken) -> Result<(), AuthError> {
        let path = token_path(&self.base, &token.client);
        write_private(&path, token.access_token.as_bytes())?;
        self.tokens.write().insert(token.client.clone(), token);
        Ok(())
    }

    /// Snapshot of the current record for `client`.
    pub fn get(&self, client: &str) -> Option<ClientToken> {
        self.tokens.read().get(client).cloned()
    }

    /// The bearer string for `client`, refusing expired tokens.
    ///
    /// Agents that do not refresh tokens themselves (the node agent does
    /// it for the whole host) fall through to disk here, picking up
    /// whatever the refresher persisted since the last call.
    pub fn bearer(&self, client: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        if let Some(token) = self.get(client) {
            if token.is_current(now) {
                return Ok(token.access_token);
            }
        }

        match self.reload(client) {
            Ok(token) if token.is_current(now) => Ok(token.access_token),
            Ok(_) => {
                warn!(client, "token expired and refresh has not caught up");
                Err(AuthError::Unavailable(client.to_string()))
            }
            Err(AuthError::MissingExpiry(client)) => Err(AuthError::MissingExpiry(client)),
            Err(_) => Err(AuthError::Unavailable(client.to_string())),
        }
    }

    /// Re-read the persisted token for `client` into the map.
    pub fn reload(&self, client: &str) -> Result<ClientToken, AuthError> {
        let token = self.load_persisted(client)?;
        self.tokens.write().insert(client.to_string(), token.clone());
        Ok(token)
    }

    /// Attach `authorization: Bearer <token>` to an outbound request.
    pub fn authorize<T>(
        &self,
        request: &mut tonic::Request<T>,
        client: &str,
    ) -> Result<(), AuthError> {
        let bearer = self.bearer(client, Utc::now())?;
        let value = MetadataValue::try_from(format!("Bearer {bearer}"))
            .map_err(|_| AuthError::Unavailable(client.to_string()))?;
        request.metadata_mut().insert(AUTHORIZATION_KEY, value);
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
