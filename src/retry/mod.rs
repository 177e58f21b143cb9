//! Retry classification, policy and reference loop.
//!
//! This module maps attempt outcomes onto failure categories (server error,
//! network error, timeout, rate limited), combines the enabled categories into a
//! single policy, and provides a small loop that drives the policy so callers
//! without their own executor can share a consistent behaviour.

mod classify;
mod policy;
mod run;

pub use classify::{
    is_network_error, is_rate_limited, is_rate_limited_with, is_server_error, is_timeout,
    CategorySet, Classifier, FailureCategory, RateLimitDetection, DEFAULT_SERVER_ERROR_CODES,
};
pub use policy::{RetryDecision, RetryPolicy, RetryPolicyBuilder};
pub use run::{run_with_retry, run_with_retry_async, RunError, DEFAULT_MAX_ATTEMPTS};
