//! Classify attempt outcomes into retry failure categories.

use std::collections::HashSet;

use http::header::RETRY_AFTER;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::outcome::{ErrorKind, Outcome};

/// 5xx statuses retried as server errors unless overridden.
pub const DEFAULT_SERVER_ERROR_CODES: [u16; 4] = [500, 502, 503, 504];

/// Failure category of one outcome. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    ServerError,
    NetworkError,
    Timeout,
    RateLimited,
    /// Success, or a failure no enabled category recognises.
    Unclassified,
}

impl FailureCategory {
    /// Order in which categories are tested; the first match wins.
    pub const PRIORITY: [FailureCategory; 4] = [
        FailureCategory::ServerError,
        FailureCategory::NetworkError,
        FailureCategory::Timeout,
        FailureCategory::RateLimited,
    ];
}

/// How a rate-limited response is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitDetection {
    /// Status `429 Too Many Requests`.
    #[default]
    TooManyRequests,
    /// Any error response carrying a `Retry-After` header, whatever its status.
    RetryAfterHeader,
}

/// True if the outcome is a `429 Too Many Requests` response.
pub fn is_rate_limited(outcome: Outcome<'_>) -> bool {
    is_rate_limited_with(outcome, RateLimitDetection::TooManyRequests)
}

pub fn is_rate_limited_with(outcome: Outcome<'_>, detection: RateLimitDetection) -> bool {
    let Some(response) = outcome.response() else {
        return false;
    };
    match detection {
        RateLimitDetection::TooManyRequests => response.status() == StatusCode::TOO_MANY_REQUESTS,
        RateLimitDetection::RetryAfterHeader => response.headers().contains_key(RETRY_AFTER),
    }
}

/// True if the outcome is a response whose status is in `codes`.
pub fn is_server_error(outcome: Outcome<'_>, codes: &HashSet<u16>) -> bool {
    outcome
        .response()
        .is_some_and(|r| codes.contains(&r.status().as_u16()))
}

/// True if the failure's error kind is one of `kinds`.
pub fn is_network_error(outcome: Outcome<'_>, kinds: &HashSet<ErrorKind>) -> bool {
    outcome.error_kind().is_some_and(|k| kinds.contains(&k))
}

/// True if the failure's error kind is a timeout kind listed in `kinds`.
pub fn is_timeout(outcome: Outcome<'_>, kinds: &HashSet<ErrorKind>) -> bool {
    outcome
        .error_kind()
        .is_some_and(|k| k.is_timeout() && kinds.contains(&k))
}

/// Timeout kinds are dropped from the network set and non-timeout kinds from
/// the timeout set, so the two never overlap.
fn network_kinds(kinds: impl IntoIterator<Item = ErrorKind>) -> HashSet<ErrorKind> {
    kinds.into_iter().filter(|k| !k.is_timeout()).collect()
}

fn timeout_kinds(kinds: impl IntoIterator<Item = ErrorKind>) -> HashSet<ErrorKind> {
    kinds.into_iter().filter(|k| k.is_timeout()).collect()
}

/// Which categories a classifier may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySet {
    pub server_errors: bool,
    pub network_errors: bool,
    pub timeouts: bool,
    pub rate_limited: bool,
}

impl CategorySet {
    pub const ALL: CategorySet = CategorySet {
        server_errors: true,
        network_errors: true,
        timeouts: true,
        rate_limited: true,
    };

    pub fn contains(&self, category: FailureCategory) -> bool {
        match category {
            FailureCategory::ServerError => self.server_errors,
            FailureCategory::NetworkError => self.network_errors,
            FailureCategory::Timeout => self.timeouts,
            FailureCategory::RateLimited => self.rate_limited,
            FailureCategory::Unclassified => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.server_errors || self.network_errors || self.timeouts || self.rate_limited)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::ALL
    }
}

/// Classification rules: status/kind sets, rate-limit detection, enabled categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    server_error_codes: HashSet<u16>,
    network_errors: HashSet<ErrorKind>,
    timeouts: HashSet<ErrorKind>,
    rate_limit_detection: RateLimitDetection,
    enabled: CategorySet,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            server_error_codes: DEFAULT_SERVER_ERROR_CODES.into_iter().collect(),
            network_errors: ErrorKind::default_network_errors(),
            timeouts: ErrorKind::default_timeouts(),
            rate_limit_detection: RateLimitDetection::default(),
            enabled: CategorySet::ALL,
        }
    }
}

impl Classifier {
    pub fn new(
        server_error_codes: HashSet<u16>,
        network_errors: HashSet<ErrorKind>,
        timeouts: HashSet<ErrorKind>,
        rate_limit_detection: RateLimitDetection,
        enabled: CategorySet,
    ) -> Self {
        Self {
            server_error_codes,
            network_errors: network_kinds(network_errors),
            timeouts: timeout_kinds(timeouts),
            rate_limit_detection,
            enabled,
        }
    }

    pub fn with_server_error_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.server_error_codes = codes.into_iter().collect();
        self
    }

    pub fn with_network_errors(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.network_errors = network_kinds(kinds);
        self
    }

    pub fn with_timeouts(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.timeouts = timeout_kinds(kinds);
        self
    }

    pub fn with_rate_limit_detection(mut self, detection: RateLimitDetection) -> Self {
        self.rate_limit_detection = detection;
        self
    }

    pub fn with_enabled(mut self, enabled: CategorySet) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn enabled(&self) -> CategorySet {
        self.enabled
    }

    pub fn server_error_codes(&self) -> &HashSet<u16> {
        &self.server_error_codes
    }

    pub fn network_errors(&self) -> &HashSet<ErrorKind> {
        &self.network_errors
    }

    pub fn timeouts(&self) -> &HashSet<ErrorKind> {
        &self.timeouts
    }

    pub fn rate_limit_detection(&self) -> RateLimitDetection {
        self.rate_limit_detection
    }

    /// Whether `outcome` matches `category`'s predicate, ignoring enabled flags.
    pub fn matches(&self, category: FailureCategory, outcome: Outcome<'_>) -> bool {
        match category {
            FailureCategory::ServerError => is_server_error(outcome, &self.server_error_codes),
            FailureCategory::NetworkError => is_network_error(outcome, &self.network_errors),
            FailureCategory::Timeout => is_timeout(outcome, &self.timeouts),
            FailureCategory::RateLimited => {
                is_rate_limited_with(outcome, self.rate_limit_detection)
            }
            FailureCategory::Unclassified => false,
        }
    }

    /// First enabled category, in priority order, that the outcome matches.
    pub fn classify(&self, outcome: Outcome<'_>) -> FailureCategory {
        if !outcome.is_failure() {
            return FailureCategory::Unclassified;
        }
        FailureCategory::PRIORITY
            .into_iter()
            .filter(|c| self.enabled.contains(*c))
            .find(|c| self.matches(*c, outcome))
            .unwrap_or(FailureCategory::Unclassified)
    }
}
