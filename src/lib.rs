//! Context-aware retry policies for transient HTTP failures.
//!
//! Outcomes are classified as server errors, network errors, timeouts or rate
//! limiting, and each category gets its own wait strategy. `Retry-After` style
//! headers are honoured as delta-seconds or HTTP-dates. The policy only answers
//! "retry?" and "how long?"; looping and sleeping belong to the executor
//! ([`retry::run_with_retry`] or your own).

pub mod adapters;
pub mod clock;
pub mod config;
pub mod error;
pub mod http_date;
pub mod logging;
pub mod outcome;
pub mod retry;
pub mod wait;

pub use error::Error;
pub use outcome::{AttemptState, ErrorKind, HttpError, HttpFailure, Outcome, ResponseSnapshot};
pub use retry::{FailureCategory, RetryDecision, RetryPolicy, RunError};
pub use wait::{ContextAwareWait, HeaderWait, WaitStrategy};
