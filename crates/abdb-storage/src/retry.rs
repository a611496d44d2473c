// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-shot deferred retry for transaction token conflicts.
//!
//! The wait happens on a timer outside the lane: other operations (including
//! the one that finishes the blocking transaction) keep flowing while a
//! deferred operation sleeps, and the re-attempt is validated afresh.

use std::future::Future;
use std::time::Duration;

use abdb_core::AbdbError;
use tracing::{debug, warn};

/// Run `attempt`; on a token conflict with a non-zero `timeout`, run it exactly
/// once more after `timeout` has elapsed.
///
/// Errors that are not conflicts, and conflicts with a zero budget, are
/// returned immediately.
pub async fn with_deferred_retry<T, F, Fut>(
    op: &'static str,
    timeout: Duration,
    mut attempt: F,
) -> Result<T, AbdbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AbdbError>>,
{
    let result = match attempt().await {
        Err(err) if err.is_conflict() && !timeout.is_zero() => {
            debug!(op, ?timeout, error = %err, "token conflict, deferring retry");
            tokio::time::sleep(timeout).await;
            attempt().await
        }
        result => result,
    };

    if let Err(err) = &result
        && err.is_conflict()
    {
        warn!(op, error = %err, "rejected by transaction policy");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use abdb_core::TransactionId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn conflict() -> AbdbError {
        AbdbError::OtherTransactionAlreadyInProgress(TransactionId(0))
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_reports_conflict_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_deferred_retry("test", Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(conflict()) }
        })
        .await;

        assert_eq!(result, Err(conflict()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_is_retried_exactly_once_after_the_delay() {
        let calls = AtomicUsize::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = with_deferred_retry("test", Duration::from_millis(500), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(conflict()) }
        })
        .await;

        assert_eq!(result, Err(conflict()));
        assert_eq!(calls.load(Ordering::SeqCst), 2, "single re-check, not a loop");
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_returns_second_attempt_result() {
        let calls = AtomicUsize::new(0);
        let result = with_deferred_retry("test", Duration::from_millis(10), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(conflict())
                } else {
                    Ok(TransactionId(1))
                }
            }
        })
        .await;

        assert_eq!(result, Ok(TransactionId(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn non_conflict_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_deferred_retry("test", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AbdbError::NoTransactionInProgress) }
        })
        .await;

        assert_eq!(result, Err(AbdbError::NoTransactionInProgress));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
