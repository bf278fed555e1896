// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::time::Instant;

#[tokio::test]
async fn true_succeeds() {
    let cancel = CancellationToken::new();
    run_shell("install", "/bin/true", &cancel).await.unwrap();
}

#[tokio::test]
async fn false_reports_exit_code() {
    let cancel = CancellationToken::new();
    match run_shell("install", "/bin/false", &cancel).await {
        Err(ExecError::CommandFailed { label, code }) => {
            assert_eq!(label, "install");
            assert_eq!(code, 1);
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_binary_fails_with_exit_code() {
    // `sh -c` reports a missing command as exit 127 rather than a spawn
    // error.
    let cancel = CancellationToken::new();
    match run_shell("install", "/no/such/binary", &cancel).await {
        Err(ExecError::CommandFailed { code, .. }) => assert_eq!(code, 127),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_kills_the_child_promptly() {
    let cancel = CancellationToken::new();
    let killer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        killer.cancel();
    });

    let started = Instant::now();
    let result = run_shell("install", "sleep 30", &cancel).await;

    assert!(matches!(result, Err(ExecError::Killed { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cancellation_kills_the_whole_group() {
    // The command forks a grandchild; group kill must take both down.
    let cancel = CancellationToken::new();
    let killer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        killer.cancel();
    });

    let started = Instant::now();
    let result = run_shell("install", "sleep 30 & sleep 30", &cancel).await;

    assert!(matches!(result, Err(ExecError::Killed { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn output_does_not_block_completion() {
    // Enough output to overflow a pipe buffer if nobody drained it.
    let cancel = CancellationToken::new();
    run_shell("install", "yes x | head -c 200000", &cancel).await.unwrap();
}
