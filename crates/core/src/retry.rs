// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable exponential backoff and the per-call RPC deadline.
//!
//! Every outbound call an agent makes goes through one of these two
//! combinators: `rpc_timeout` bounds a single attempt, `retry_with_cancel`
//! drives attempts at increasing intervals until success, cancellation, or
//! an optional retry cap.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Deadline applied to every single outbound RPC attempt.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(5);

const INITIAL_INTERVAL: Duration = Duration::from_millis(500);
const MULTIPLIER: f64 = 1.5;
const MAX_INTERVAL: Duration = Duration::from_secs(60);
const RANDOMIZATION_FACTOR: f64 = 0.2;

/// Why a retried operation gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The root cancellation token fired; in-flight retries abort at once.
    #[error("operation canceled")]
    Canceled,

    /// The retry cap was reached; carries the last attempt's error.
    #[error("retries exhausted")]
    Exhausted(#[source] E),
}

impl<E> RetryError<E> {
    /// The last attempt's error, if the loop exhausted rather than canceled.
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::Canceled => None,
            RetryError::Exhausted(e) => Some(e),
        }
    }
}

fn policy() -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(INITIAL_INTERVAL)
        .with_multiplier(MULTIPLIER)
        .with_max_interval(MAX_INTERVAL)
        .with_randomization_factor(RANDOMIZATION_FACTOR)
        // The caller bounds the loop via `max_retries` or cancellation, not
        // elapsed time.
        .with_max_elapsed_time(None)
        .build()
}

/// Run `op` under exponential backoff until it succeeds, the token cancels,
/// or `max_retries` attempts have failed.
///
/// `max_retries` counts attempts, so `Some(3)` means at most three calls to
/// `op`. `None` retries until success or cancellation.
pub async fn retry_with_cancel<T, E, F, Fut>(
    cancel: &CancellationToken,
    max_retries: Option<u32>,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut policy = policy();
    policy.reset();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Canceled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts += 1;
                if max_retries.is_some_and(|cap| attempts >= cap) {
                    return Err(RetryError::Exhausted(err));
                }
                // With no max elapsed time the policy always yields a delay.
                let delay = match policy.next_backoff() {
                    Some(delay) => delay,
                    None => return Err(RetryError::Exhausted(err)),
                };
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Canceled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Bound a single outbound call by the standard 5 s deadline.
///
/// Returns `None` when the deadline elapsed before the call finished.
pub async fn rpc_timeout<F>(fut: F) -> Option<F::Output>
where
    F: Future,
{
    tokio::time::timeout(RPC_TIMEOUT, fut).await.ok()
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
