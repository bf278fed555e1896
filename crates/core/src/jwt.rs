// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry extraction from bearer tokens.
//!
//! The orchestrator verifies signatures; agents only need the `exp` claim to
//! schedule refreshes, so the payload segment is decoded without any
//! signature check.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token is not a JWT (expected three dot-separated segments)")]
    Malformed,

    #[error("token payload is not valid base64url JSON: {0}")]
    Payload(String),

    #[error("token carries no exp claim")]
    MissingExpiry,
}

/// Decode the unverified `exp` claim of a JWT as a UTC instant.
pub fn token_expiry(token: &str) -> Result<DateTime<Utc>, JwtError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(JwtError::Malformed),
    };

    let bytes =
        URL_SAFE_NO_PAD.decode(payload).map_err(|e| JwtError::Payload(e.to_string()))?;
    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| JwtError::Payload(e.to_string()))?;

    let exp = claims.get("exp").and_then(|v| v.as_i64()).ok_or(JwtError::MissingExpiry)?;
    Utc.timestamp_opt(exp, 0).single().ok_or(JwtError::MissingExpiry)
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
