//! Wait strategies: how long to pause before the next attempt.
//!
//! A [`WaitStrategy`] maps an [`AttemptState`] to a duration. Header-derived
//! strategies may fail (see [`crate::error::Error`]); the others never do.
//! [`ContextAwareWait`] picks a strategy per failure category.

mod backoff;
mod context;
mod header;

use std::time::Duration;

use http::header::HeaderName;

use crate::error::Result;
use crate::outcome::AttemptState;

pub use backoff::ExponentialBackoff;
pub use context::ContextAwareWait;
pub use header::{parse_wait_value, HeaderWait, DEFAULT_RETRY_AFTER_MAX};

#[derive(Debug, Clone, PartialEq)]
pub enum WaitStrategy {
    /// Same delay after every attempt.
    Fixed(Duration),
    Exponential(ExponentialBackoff),
    /// Full jitter over the exponential envelope.
    ExponentialJitter(ExponentialBackoff),
    HeaderDerived(HeaderWait),
}

impl WaitStrategy {
    pub fn fixed(delay: Duration) -> Self {
        WaitStrategy::Fixed(delay)
    }

    /// Exponential backoff with default parameters (1s, 2s, 4s, ... up to 60s).
    pub fn exponential() -> Self {
        WaitStrategy::Exponential(ExponentialBackoff::default())
    }

    pub fn exponential_jitter() -> Self {
        WaitStrategy::ExponentialJitter(ExponentialBackoff::default())
    }

    /// Derive the wait from `header`, using `fallback` when that fails.
    pub fn from_header(header: HeaderName, fallback: WaitStrategy) -> Self {
        WaitStrategy::HeaderDerived(HeaderWait::new(header).with_fallback(fallback))
    }

    /// `Retry-After` with a 120s ceiling and exponential fallback.
    pub fn retry_after() -> Self {
        WaitStrategy::HeaderDerived(HeaderWait::retry_after())
    }

    /// Default strategy for rate-limited responses; same as [`retry_after`](Self::retry_after).
    pub fn rate_limited() -> Self {
        Self::retry_after()
    }

    pub fn wait(&self, state: &AttemptState<'_>) -> Result<Duration> {
        match self {
            WaitStrategy::Fixed(d) => Ok(*d),
            WaitStrategy::Exponential(b) => Ok(b.delay(state.attempt)),
            WaitStrategy::ExponentialJitter(b) => Ok(b.jittered_delay(state.attempt)),
            WaitStrategy::HeaderDerived(h) => h.wait(state),
        }
    }
}

impl From<HeaderWait> for WaitStrategy {
    fn from(h: HeaderWait) -> Self {
        WaitStrategy::HeaderDerived(h)
    }
}

impl From<ExponentialBackoff> for WaitStrategy {
    fn from(b: ExponentialBackoff) -> Self {
        WaitStrategy::Exponential(b)
    }
}
