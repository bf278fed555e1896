// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn interval_roundtrips() {
    let response = Response::Interval { seconds: 10 };
    let json = serde_json::to_string(&response).unwrap();
    let back: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(back, response);
}

#[test]
fn error_carries_kind_and_message() {
    let response = Response::Error {
        kind: ErrorKind::UnknownAgent,
        message: "agent \"rogue\" not expected on this node".to_string(),
    };
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["type"], "Error");
    assert_eq!(json["kind"], "UnknownAgent");
}
