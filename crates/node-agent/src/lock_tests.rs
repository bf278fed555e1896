// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquires_and_writes_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node-agent.pid");

    let lock = InstanceLock::acquire(&path).unwrap();

    let pid: u32 = std::fs::read_to_string(&path).unwrap().trim().parse().unwrap();
    assert_eq!(pid, std::process::id());
    drop(lock);
    assert!(!path.exists());
}

#[test]
fn second_acquire_fails_while_held() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node-agent.pid");

    let _held = InstanceLock::acquire(&path).unwrap();
    assert!(matches!(
        InstanceLock::acquire(&path),
        Err(LockError::AlreadyRunning(_))
    ));
}

#[test]
fn lock_is_reacquirable_after_release() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node-agent.pid");

    drop(InstanceLock::acquire(&path).unwrap());
    let second = InstanceLock::acquire(&path);
    assert!(second.is_ok());
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run/node-agent/node-agent.pid");

    let lock = InstanceLock::acquire(&path).unwrap();
    assert!(path.exists());
    drop(lock);
}
