// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token persistence invariants across the store boundary.

use std::os::unix::fs::PermissionsExt;

use chrono::{Duration, Utc};

use en_core::test_support::{fake_jwt, fake_jwt_with_claims};
use en_tokens::{AuthError, ClientToken, TokenStore};

#[test]
fn persisted_tokens_always_outlive_their_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path());

    let expiry = Utc::now() + Duration::hours(1);
    let token = ClientToken::from_jwt("node-agent", &fake_jwt(expiry)).unwrap();
    store.put(token).unwrap();

    let persisted = store.get("node-agent").unwrap();
    assert!(persisted.expiry > Utc::now());

    let path = dir.path().join("node-agent/access_token");
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}

#[test]
fn token_without_decodable_expiry_is_never_persisted() {
    let no_exp = fake_jwt_with_claims(&serde_json::json!({ "sub": "node-agent" }));
    assert!(ClientToken::from_jwt("node-agent", &no_exp).is_err());

    // And one already on disk fails the boot hard.
    let dir = tempfile::tempdir().unwrap();
    let client_dir = dir.path().join("node-agent");
    std::fs::create_dir_all(&client_dir).unwrap();
    std::fs::write(client_dir.join("access_token"), &no_exp).unwrap();

    let store = TokenStore::new(dir.path());
    assert!(matches!(
        store.bootstrap(&["node-agent"]),
        Err(AuthError::MissingExpiry(_))
    ));
}

#[test]
fn symlinked_token_file_is_never_read() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("real_token");
    std::fs::write(&real, fake_jwt(Utc::now() + Duration::hours(1))).unwrap();

    let client_dir = dir.path().join("node-agent");
    std::fs::create_dir_all(&client_dir).unwrap();
    std::os::unix::fs::symlink(&real, client_dir.join("access_token")).unwrap();

    let store = TokenStore::new(dir.path());
    // Substituted file: treated as unreadable, scheduled for refresh.
    let stale = store.bootstrap(&["node-agent"]).unwrap();
    assert_eq!(stale, vec!["node-agent".to_string()]);
    assert!(store.get("node-agent").is_none());
}
