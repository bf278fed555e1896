// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture builders shared by other crates' tests.

#![allow(clippy::unwrap_used)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Build an unsigned JWT whose payload carries the given `exp` claim.
///
/// The signature segment is garbage; agents never verify it.
pub fn fake_jwt(exp: DateTime<Utc>) -> String {
    fake_jwt_with_claims(&serde_json::json!({ "exp": exp.timestamp() }))
}

/// Build an unsigned JWT with an arbitrary claims object.
pub fn fake_jwt_with_claims(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.sig")
}

/// Write an agent config YAML into `dir` and return its path.
pub fn write_config(dir: &std::path::Path, name: &str, yaml: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, yaml).unwrap();
    path
}

/// A minimal valid agent config body for tests.
pub fn minimal_config_yaml() -> String {
    [
        "version: v0.3.0",
        "GUID: 8d5f47f3-2dbe-4f52-a7a3-01d5e9d3f8a1",
        "serviceURL: orchestrator.edge.example:8080",
        "accessTokenPath: /tmp/en-tokens",
        "heartbeatInterval: 10",
        "logLevel: info",
    ]
    .join("\n")
}
