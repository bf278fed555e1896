// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn roundtrips_across_a_simulated_reboot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbc-update-status.json");

    let state = UpdateStateFile::sota("3.0.20240321");
    state.write(&path).unwrap();

    let back = UpdateStateFile::read(&path).unwrap().unwrap();
    assert_eq!(back, state);
    assert_eq!(back.restart_reason, RESTART_REASON_SOTA);
}

#[test]
fn absent_file_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(UpdateStateFile::read(&dir.path().join("missing.json")).unwrap().is_none());
}

#[test]
fn remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbc-update-status.json");
    UpdateStateFile::sota("v1").write(&path).unwrap();

    UpdateStateFile::remove(&path).unwrap();
    UpdateStateFile::remove(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn corrupt_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbc-update-status.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(UpdateStateFile::read(&path).is_err());
}
