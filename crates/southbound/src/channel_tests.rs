// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builds_tls_endpoint_by_default() {
    let endpoint = SouthboundEndpoint::new("orchestrator.edge.example:8080", &TlsSettings::default());
    assert!(endpoint.is_ok());
}

#[test]
fn dev_mode_builds_plaintext_endpoint() {
    let tls = TlsSettings { insecure: true, ..Default::default() };
    let endpoint = SouthboundEndpoint::new("127.0.0.1:50051", &tls).unwrap();
    // Lazy channels never dial at construction time.
    let _ = endpoint.channel();
}

#[test]
fn invalid_url_is_invalid_argument() {
    let result = SouthboundEndpoint::new("not a url\u{7f}", &TlsSettings::default());
    assert!(matches!(result, Err(RpcError::InvalidArgument(_))));
}
