// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn returns_first_success() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<u32, RetryError<&str>> = retry_with_cancel(&cancel, None, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_until_success() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<u32, RetryError<&str>> = retry_with_cancel(&cancel, None, || {
        let counter = Arc::clone(&counter);
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("not yet")
            } else {
                Ok(42)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn cap_returns_last_error() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<u32, RetryError<String>> = retry_with_cancel(&cancel, Some(3), || {
        let counter = Arc::clone(&counter);
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Err(format!("attempt {n}"))
        }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(RetryError::Exhausted(msg)) => assert_eq!(msg, "attempt 2"),
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_between_attempts() {
    let cancel = CancellationToken::new();
    let inner = cancel.clone();

    let result: Result<u32, RetryError<&str>> = retry_with_cancel(&cancel, None, || {
        let inner = inner.clone();
        async move {
            // Fail once, then cancel while the loop sleeps.
            inner.cancel();
            Err("down")
        }
    })
    .await;

    assert!(matches!(result, Err(RetryError::Canceled)));
}

#[tokio::test(start_paused = true)]
async fn pre_cancelled_token_never_calls_op() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let result: Result<(), RetryError<&str>> = retry_with_cancel(&cancel, None, || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .await;

    assert!(matches!(result, Err(RetryError::Canceled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn rpc_timeout_cuts_off_slow_calls() {
    let slow = rpc_timeout(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        1
    });
    assert_eq!(slow.await, None);

    let fast = rpc_timeout(async { 2 });
    assert_eq!(fast.await, Some(2));
}

#[test]
fn into_last_keeps_only_exhaustion() {
    let exhausted: RetryError<&str> = RetryError::Exhausted("boom");
    assert_eq!(exhausted.into_last(), Some("boom"));
    let canceled: RetryError<&str> = RetryError::Canceled;
    assert_eq!(canceled.into_last(), None);
}
