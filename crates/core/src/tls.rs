// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS client configuration for southbound channels.
//!
//! Trusts the system root store plus an optional orchestrator CA. There is
//! no skip-verify knob: the only way to get a plaintext channel is the
//! explicit dev-mode flag, and that disables transport security entirely
//! rather than half-verifying it.

use std::path::PathBuf;

use thiserror::Error;
use tonic::transport::{Certificate, ClientTlsConfig};
use tracing::warn;

use crate::safefile::{read_no_symlink, FileError};

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("CA bundle: {0}")]
    File(#[from] FileError),

    #[error("no certificates found in CA bundle {0}")]
    NoCertificates(PathBuf),

    #[error("CA bundle {path} is not valid PEM: {reason}")]
    InvalidPem { path: PathBuf, reason: String },
}

/// Transport security knobs, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// Extra CA bundle (PEM) trusted alongside the system roots.
    pub ca_path: Option<PathBuf>,
    /// Override for the server name verified on the connection.
    pub domain: Option<String>,
    /// Dev mode only: plaintext transport.
    pub insecure: bool,
}

/// Build the client TLS config, or `None` when dev mode disables transport
/// security.
pub fn client_tls(settings: &TlsSettings) -> Result<Option<ClientTlsConfig>, TlsError> {
    if settings.insecure {
        warn!("dev mode: transport security disabled");
        return Ok(None);
    }

    let mut tls = ClientTlsConfig::new().with_native_roots();

    if let Some(ca_path) = &settings.ca_path {
        let pem = read_no_symlink(ca_path)?;
        let certs: Vec<_> = rustls_pemfile::certs(&mut pem.as_slice())
            .collect::<Result<_, _>>()
            .map_err(|e| TlsError::InvalidPem {
                path: ca_path.clone(),
                reason: e.to_string(),
            })?;
        if certs.is_empty() {
            return Err(TlsError::NoCertificates(ca_path.clone()));
        }
        tls = tls.ca_certificate(Certificate::from_pem(pem));
    }

    if let Some(domain) = &settings.domain {
        tls = tls.domain_name(domain.clone());
    }

    Ok(Some(tls))
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tests;
