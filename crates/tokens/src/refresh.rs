// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token acquisition against the identity provider and release service.
//!
//! Service clients exchange `client_credentials` for a JWT; the release
//! service hands back a token body verbatim (possibly the literal
//! `anonymous`). The refresher task re-checks every client once a minute
//! and replaces tokens inside the 10-minute pre-expiry window.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use en_core::read_to_string_no_symlink;

use crate::token::ClientToken;
use crate::{clients, AuthError, TokenStore, ANONYMOUS_TOKEN};

/// Cadence of the per-client refresh check.
pub const CHECK_PERIOD: Duration = Duration::from_secs(60);

/// Where tokens come from. Seam for tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `grant_type=client_credentials` exchange; returns the JWT body.
    async fn client_credentials(&self, client: &str) -> Result<String, AuthError>;

    /// Release-service token fetch under the node agent's bearer; the
    /// response body is the token verbatim.
    async fn release_token(&self, bearer: &str) -> Result<String, AuthError>;
}

/// Identity-provider endpoints and credential locations.
#[derive(Debug, Clone)]
pub struct IdpSettings {
    /// Keycloak-style token endpoint base, e.g. `https://keycloak.example`.
    pub idp_url: String,
    /// Directory holding `client_id` and `client_secret`.
    pub credentials_path: PathBuf,
    /// Release service FQDN, when this node refreshes the release client.
    pub release_service_url: Option<String>,
}

/// Real identity provider over HTTPS.
///
/// The client honors `HTTPS_PROXY` from the environment; UNIX-socket
/// endpoints never go through here.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    settings: IdpSettings,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl HttpIdentityProvider {
    pub fn new(settings: IdpSettings) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(en_core::RPC_TIMEOUT)
            .build()
            .map_err(AuthError::from)?;
        Ok(Self { http, settings })
    }

    fn credential(&self, name: &str) -> Result<String, AuthError> {
        let path = self.settings.credentials_path.join(name);
        Ok(read_to_string_no_symlink(&path)?.trim().to_string())
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn client_credentials(&self, client: &str) -> Result<String, AuthError> {
        let client_id = self.credential("client_id")?;
        let client_secret = self.credential("client_secret")?;

        let url = format!(
            "{}/realms/master/protocol/openid-connect/token",
            self.settings.idp_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: TokenResponse = response.json().await?;
        debug!(client, "acquired service token");
        Ok(body.access_token)
    }

    async fn release_token(&self, bearer: &str) -> Result<String, AuthError> {
        let base = self
            .settings
            .release_service_url
            .as_deref()
            .ok_or_else(|| AuthError::Idp("release service URL not configured".to_string()))?;

        let url = format!("{}/token", base.trim_end_matches('/'));
        let response =
            self.http.get(url).bearer_auth(bearer).send().await?.error_for_status()?;
        Ok(response.text().await?.trim().to_string())
    }
}

/// Force-refresh hook handed to callers that hit `Unauthenticated`.
///
/// The contract is exactly one refresh before the caller's retry.
#[async_trait]
pub trait ForceRefresh: Send + Sync {
    async fn force_refresh(&self, client: &str) -> Result<(), AuthError>;
}

/// Force refresh for daemons that never contact the identity provider:
/// re-read the persisted token file the node agent rotates.
///
/// A token revoked server-side before its cached expiry is replaced on
/// disk by the node agent's refresher; reloading picks that up without
/// waiting out the stale copy's lifetime.
pub struct DiskRefresh {
    store: Arc<TokenStore>,
}

impl DiskRefresh {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ForceRefresh for DiskRefresh {
    async fn force_refresh(&self, client: &str) -> Result<(), AuthError> {
        self.store.reload(client).map(|_| ())
    }
}

/// Drives refreshes for a fixed set of clients.
pub struct TokenRefresher<P> {
    store: Arc<TokenStore>,
    provider: P,
}

#[async_trait]
impl<P: IdentityProvider> ForceRefresh for TokenRefresher<P> {
    async fn force_refresh(&self, client: &str) -> Result<(), AuthError> {
        self.refresh(client).await
    }
}

impl<P: IdentityProvider> TokenRefresher<P> {
    pub fn new(store: Arc<TokenStore>, provider: P) -> Self {
        Self { store, provider }
    }

    /// Acquire and persist a fresh token for `client`.
    ///
    /// The release client authenticates with the node agent's current
    /// token; everything else goes through client credentials.
    pub async fn refresh(&self, client: &str) -> Result<(), AuthError> {
        let token = if client == clients::RELEASE_SERVICE {
            let bearer = self.store.bearer(clients::NODE_AGENT, Utc::now())?;
            let body = self.provider.release_token(&bearer).await?;
            if body == ANONYMOUS_TOKEN {
                ClientToken::anonymous(client)
            } else {
                ClientToken::from_jwt(client, &body)
                    .map_err(|e| AuthError::Decode(client.to_string(), e))?
            }
        } else {
            let body = self.provider.client_credentials(client).await?;
            // A token whose exp cannot be decoded is never persisted.
            ClientToken::from_jwt(client, &body)
                .map_err(|e| AuthError::Decode(client.to_string(), e))?
        };

        self.store.put(token)?;
        info!(client, "token refreshed");
        Ok(())
    }

    /// Refresh every client whose token is inside the pre-expiry window.
    pub async fn refresh_due(&self, client_names: &[String]) {
        let now = Utc::now();
        for client in client_names {
            let due = match self.store.get(client) {
                Some(token) => token.is_refresh_required(now),
                None => true,
            };
            if !due {
                continue;
            }
            if let Err(err) = self.refresh(client).await {
                // An IDP outage is not fatal; outbound calls fail fast with
                // Unavailable until a later pass succeeds.
                warn!(client, %err, "token refresh failed");
            }
        }
    }

    /// Periodic refresh task; exits when the root token cancels.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken, client_names: Vec<String>) {
        let mut ticker = tokio::time::interval(CHECK_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("token refresher stopping");
                    return;
                }
                _ = ticker.tick() => self.refresh_due(&client_names).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
