use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::outcome::{AttemptState, ErrorKind, Outcome};
use crate::wait::{ContextAwareWait, WaitStrategy};

use super::classify::{
    CategorySet, Classifier, FailureCategory, RateLimitDetection, DEFAULT_SERVER_ERROR_CODES,
};

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this outcome.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::RetryAfter(_))
    }

    /// The `(retry?, wait)` pair expected by generic retry loops.
    pub fn as_pair(&self) -> (bool, Duration) {
        match *self {
            RetryDecision::NoRetry => (false, Duration::ZERO),
            RetryDecision::RetryAfter(d) => (true, d),
        }
    }
}

/// Immutable retry policy: which failures to retry and how long to wait.
///
/// Stateless after construction; share it behind an `Arc` across concurrent
/// retry loops. It never counts attempts or sleeps; that is the executor's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryPolicy {
    wait: ContextAwareWait,
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    pub fn classify(&self, outcome: Outcome<'_>) -> FailureCategory {
        self.wait.classifier().classify(outcome)
    }

    /// OR over the enabled categories' predicates.
    pub fn should_retry(&self, outcome: Outcome<'_>) -> bool {
        self.classify(outcome) != FailureCategory::Unclassified
    }

    /// Wait before the next attempt. Zero for outcomes that are not retried.
    pub fn wait(&self, state: &AttemptState<'_>) -> Result<Duration> {
        self.wait.wait(state)
    }

    /// Combined decision for one finished attempt.
    ///
    /// Errors only when a header strategy without fallback cannot produce a wait;
    /// callers must abort rather than retry in that case.
    pub fn decide(&self, state: &AttemptState<'_>) -> Result<RetryDecision> {
        if !self.should_retry(state.outcome) {
            return Ok(RetryDecision::NoRetry);
        }
        self.wait(state).map(RetryDecision::RetryAfter)
    }

    /// Should-retry predicate for executors that take one.
    pub fn predicate(&self) -> impl Fn(Outcome<'_>) -> bool + Send + Sync + '_ {
        move |outcome: Outcome<'_>| self.should_retry(outcome)
    }

    /// Wait dispatcher for executors that take one.
    pub fn dispatcher(&self) -> &ContextAwareWait {
        &self.wait
    }

    pub fn enabled(&self) -> CategorySet {
        self.wait.classifier().enabled()
    }
}

/// Builder mirroring the toggles and overrides of a retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    enabled: CategorySet,
    wait_server_errors: WaitStrategy,
    wait_network_errors: WaitStrategy,
    wait_timeouts: WaitStrategy,
    wait_rate_limited: WaitStrategy,
    server_error_codes: HashSet<u16>,
    network_errors: HashSet<ErrorKind>,
    timeouts: HashSet<ErrorKind>,
    rate_limit_detection: RateLimitDetection,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            enabled: CategorySet::ALL,
            wait_server_errors: WaitStrategy::exponential_jitter(),
            wait_network_errors: WaitStrategy::exponential(),
            wait_timeouts: WaitStrategy::exponential_jitter(),
            wait_rate_limited: WaitStrategy::rate_limited(),
            server_error_codes: DEFAULT_SERVER_ERROR_CODES.into_iter().collect(),
            network_errors: ErrorKind::default_network_errors(),
            timeouts: ErrorKind::default_timeouts(),
            rate_limit_detection: RateLimitDetection::default(),
        }
    }
}

impl RetryPolicyBuilder {
    pub fn retry_server_errors(mut self, enabled: bool) -> Self {
        self.enabled.server_errors = enabled;
        self
    }

    pub fn retry_network_errors(mut self, enabled: bool) -> Self {
        self.enabled.network_errors = enabled;
        self
    }

    pub fn retry_timeouts(mut self, enabled: bool) -> Self {
        self.enabled.timeouts = enabled;
        self
    }

    pub fn retry_rate_limited(mut self, enabled: bool) -> Self {
        self.enabled.rate_limited = enabled;
        self
    }

    pub fn wait_server_errors(mut self, wait: WaitStrategy) -> Self {
        self.wait_server_errors = wait;
        self
    }

    pub fn wait_network_errors(mut self, wait: WaitStrategy) -> Self {
        self.wait_network_errors = wait;
        self
    }

    pub fn wait_timeouts(mut self, wait: WaitStrategy) -> Self {
        self.wait_timeouts = wait;
        self
    }

    pub fn wait_rate_limited(mut self, wait: WaitStrategy) -> Self {
        self.wait_rate_limited = wait;
        self
    }

    pub fn server_error_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.server_error_codes = codes.into_iter().collect();
        self
    }

    /// Timeout kinds are ignored here; they belong to [`Self::timeouts`].
    pub fn network_errors(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.network_errors = kinds.into_iter().collect();
        self
    }

    /// Only kinds for which [`ErrorKind::is_timeout`] holds are kept.
    pub fn timeouts(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.timeouts = kinds.into_iter().collect();
        self
    }

    pub fn rate_limit_detection(mut self, detection: RateLimitDetection) -> Self {
        self.rate_limit_detection = detection;
        self
    }

    /// Fails with [`Error::Configuration`] if every category is disabled.
    pub fn build(self) -> Result<RetryPolicy> {
        if self.enabled.is_empty() {
            return Err(Error::Configuration(
                "no retry categories enabled".to_string(),
            ));
        }
        let classifier = Classifier::new(
            self.server_error_codes,
            self.network_errors,
            self.timeouts,
            self.rate_limit_detection,
            self.enabled,
        );
        Ok(RetryPolicy {
            wait: ContextAwareWait::new(
                classifier,
                self.wait_server_errors,
                self.wait_network_errors,
                self.wait_timeouts,
                self.wait_rate_limited,
            ),
        })
    }
}
