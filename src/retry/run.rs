//! Retry loop: run a closure until success, a non-retryable failure, or the
//! attempt limit.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::Error;
use crate::outcome::{AttemptState, HttpFailure, Outcome};

use super::policy::{RetryDecision, RetryPolicy};

/// Attempt limit used when the caller has no preference (first attempt included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Why a retry loop gave up.
#[derive(Debug)]
pub enum RunError<E> {
    /// The last attempt's failure, unmodified: not retryable, or attempts exhausted.
    Operation(E),
    /// The policy could not compute a wait (header strategy without fallback).
    /// Not retried.
    Aborted { error: Error, last: E },
}

impl<E> RunError<E> {
    /// The underlying attempt failure, whichever way the loop ended.
    pub fn into_inner(self) -> E {
        match self {
            RunError::Operation(e) => e,
            RunError::Aborted { last, .. } => last,
        }
    }

    pub fn operation(&self) -> &E {
        match self {
            RunError::Operation(e) => e,
            RunError::Aborted { last, .. } => last,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RunError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Operation(e) => write!(f, "{}", e),
            RunError::Aborted { error, last } => {
                write!(f, "retry aborted after {}: {}", last, error)
            }
        }
    }
}

impl<E> std::error::Error for RunError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Operation(e) => e.source(),
            RunError::Aborted { error, .. } => Some(error),
        }
    }
}

/// Decide what follows a failed attempt: `Ok(wait)` to retry, `Err` to stop.
fn after_failure<E: HttpFailure>(
    policy: &RetryPolicy,
    attempt: u32,
    max_attempts: u32,
    clock: &dyn Clock,
    err: E,
) -> Result<Duration, RunError<E>> {
    let state = AttemptState::new(attempt, Outcome::Failure(&err), clock.now());
    if !policy.should_retry(state.outcome) {
        return Err(RunError::Operation(err));
    }
    if attempt >= max_attempts {
        tracing::debug!(attempt, max_attempts, "retry attempts exhausted");
        return Err(RunError::Operation(err));
    }
    match policy.decide(&state) {
        Ok(RetryDecision::RetryAfter(wait)) => {
            tracing::debug!(
                attempt,
                category = ?policy.classify(state.outcome),
                ?wait,
                "retrying after failure"
            );
            Ok(wait)
        }
        Ok(RetryDecision::NoRetry) => Err(RunError::Operation(err)),
        Err(error) => {
            tracing::warn!(attempt, %error, "cannot compute retry wait, aborting");
            Err(RunError::Aborted { error, last: err })
        }
    }
}

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, calls `sleep` with the policy's wait then tries again.
///
/// `clock` must be the clock `sleep` advances; HTTP-date waits are computed against it.
pub fn run_with_retry<T, E, F, S>(
    policy: &RetryPolicy,
    max_attempts: u32,
    clock: &dyn Clock,
    mut sleep: S,
    mut f: F,
) -> Result<T, RunError<E>>
where
    E: HttpFailure,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) => {
                let wait = after_failure(policy, attempt, max_attempts, clock, e)?;
                sleep(wait);
                attempt += 1;
            }
        }
    }
}

/// Async counterpart of [`run_with_retry`], sleeping on the tokio timer.
///
/// Pair it with [`TokioClock`](crate::clock::TokioClock) so header dates and sleeps
/// share one time source.
pub async fn run_with_retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    max_attempts: u32,
    clock: &dyn Clock,
    mut f: F,
) -> Result<T, RunError<E>>
where
    E: HttpFailure,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let wait = after_failure(policy, attempt, max_attempts, clock, e)?;
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
