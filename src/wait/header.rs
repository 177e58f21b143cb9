//! Wait values derived from a response header such as `Retry-After`.
//!
//! The value is either delta-seconds (`120`) or an HTTP-date naming the moment a
//! retry becomes acceptable. Dates are turned into a wait against the clock reading
//! carried by the attempt state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::{HeaderName, RETRY_AFTER};

use crate::error::{Error, Result};
use crate::http_date::parse_http_date;
use crate::outcome::AttemptState;

use super::WaitStrategy;

/// Ceiling applied to `Retry-After` by the default rate-limit strategy.
pub const DEFAULT_RETRY_AFTER_MAX: Duration = Duration::from_secs(120);

/// Header-derived wait with an optional ceiling and fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderWait {
    header: HeaderName,
    wait_max: Option<Duration>,
    fallback: Option<Box<WaitStrategy>>,
}

impl HeaderWait {
    /// No ceiling, no fallback: every header problem is an error.
    pub fn new(header: HeaderName) -> Self {
        Self {
            header,
            wait_max: None,
            fallback: None,
        }
    }

    /// `Retry-After`, capped at two minutes, falling back to exponential backoff.
    pub fn retry_after() -> Self {
        Self::new(RETRY_AFTER)
            .with_wait_max(DEFAULT_RETRY_AFTER_MAX)
            .with_fallback(WaitStrategy::exponential())
    }

    pub fn with_wait_max(mut self, wait_max: Duration) -> Self {
        self.wait_max = Some(wait_max);
        self
    }

    pub fn without_wait_max(mut self) -> Self {
        self.wait_max = None;
        self
    }

    pub fn with_fallback(mut self, fallback: WaitStrategy) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    pub fn wait_max(&self) -> Option<Duration> {
        self.wait_max
    }

    pub fn fallback(&self) -> Option<&WaitStrategy> {
        self.fallback.as_deref()
    }

    /// Wait from the header, or from the fallback when the header is missing,
    /// malformed, in the past, or above the ceiling.
    pub fn wait(&self, state: &AttemptState<'_>) -> Result<Duration> {
        match self.header_wait(state) {
            Ok(wait) => Ok(wait),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    tracing::debug!(error = %e, "header wait unavailable, using fallback");
                    fallback.wait(state)
                }
                None => Err(e),
            },
        }
    }

    /// Wait from the header alone, without consulting the fallback.
    pub fn header_wait(&self, state: &AttemptState<'_>) -> Result<Duration> {
        let name = self.header.as_str();
        let value = state
            .outcome
            .response()
            .and_then(|r| r.header(name))
            .ok_or_else(|| Error::MissingHeader {
                header: name.to_string(),
            })?;
        let value = value.to_str().map_err(|_| Error::InvalidHeaderValue {
            header: name.to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            reason: "not visible ASCII",
        })?;

        let wait = parse_wait_value(value, state.now).map_err(|reason| Error::InvalidHeaderValue {
            header: name.to_string(),
            value: value.to_string(),
            reason,
        })?;

        if let Some(max) = self.wait_max {
            if wait > max {
                return Err(Error::WaitExceedsMax {
                    header: name.to_string(),
                    wait,
                    max,
                });
            }
        }
        Ok(wait)
    }
}

/// Parse delta-seconds or an HTTP-date into a wait relative to `now`.
///
/// Errors carry a short reason; past dates are rejected rather than read as zero.
pub fn parse_wait_value(
    value: &str,
    now: DateTime<Utc>,
) -> std::result::Result<Duration, &'static str> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| "delta-seconds out of range");
    }

    let at = parse_http_date(value).ok_or("neither delta-seconds nor an HTTP-date")?;
    (at - now).to_std().map_err(|_| "HTTP-date is in the past")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_date::http_date_from_now;
    use crate::outcome::{ErrorKind, HttpError, Outcome, ResponseSnapshot};
    use chrono::TimeZone;
    use http::header::HeaderValue;
    use http::StatusCode;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn unavailable(retry_after: &str) -> HttpError {
        HttpError::status(
            ResponseSnapshot::new(StatusCode::SERVICE_UNAVAILABLE)
                .with_header(RETRY_AFTER, HeaderValue::from_str(retry_after).unwrap()),
        )
    }

    fn strict() -> HeaderWait {
        HeaderWait::new(RETRY_AFTER)
    }

    #[test]
    fn delta_seconds() {
        assert_eq!(parse_wait_value("120", now()), Ok(Duration::from_secs(120)));
        assert_eq!(parse_wait_value(" 0 ", now()), Ok(Duration::ZERO));
    }

    #[test]
    fn http_date_in_future() {
        let date = http_date_from_now(now(), 30);
        assert_eq!(parse_wait_value(&date, now()), Ok(Duration::from_secs(30)));
    }

    #[test]
    fn http_date_now_is_zero_wait() {
        let date = http_date_from_now(now(), 0);
        assert_eq!(parse_wait_value(&date, now()), Ok(Duration::ZERO));
    }

    #[test]
    fn rejected_values() {
        let past = http_date_from_now(now(), -5);
        assert!(parse_wait_value(&past, now()).is_err());
        assert!(parse_wait_value("1.5", now()).is_err());
        assert!(parse_wait_value("-3", now()).is_err());
        assert!(parse_wait_value("soon", now()).is_err());
        assert!(parse_wait_value("", now()).is_err());
        assert!(parse_wait_value("99999999999999999999999", now()).is_err());
    }

    #[test]
    fn missing_header_without_fallback() {
        let e = HttpError::status(ResponseSnapshot::new(StatusCode::SERVICE_UNAVAILABLE));
        let state = AttemptState::new(1, Outcome::Failure(&e), now());
        assert!(matches!(strict().wait(&state), Err(Error::MissingHeader { .. })));

        let transport = HttpError::transport(ErrorKind::Connect, "refused");
        let state = AttemptState::new(1, Outcome::Failure(&transport), now());
        assert!(matches!(strict().wait(&state), Err(Error::MissingHeader { .. })));
    }

    #[test]
    fn past_date_is_invalid() {
        let e = unavailable(&http_date_from_now(now(), -60));
        let state = AttemptState::new(1, Outcome::Failure(&e), now());
        assert!(matches!(
            strict().wait(&state),
            Err(Error::InvalidHeaderValue { reason: "HTTP-date is in the past", .. })
        ));
    }

    #[test]
    fn wait_max_boundary() {
        let hw = strict().with_wait_max(Duration::from_secs(5));

        let at_max = unavailable("5");
        let state = AttemptState::new(1, Outcome::Failure(&at_max), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(5)));

        let over = unavailable("6");
        let state = AttemptState::new(1, Outcome::Failure(&over), now());
        assert!(matches!(hw.wait(&state), Err(Error::WaitExceedsMax { .. })));

        let with_fallback = hw.with_fallback(WaitStrategy::fixed(Duration::from_millis(750)));
        assert_eq!(with_fallback.wait(&state), Ok(Duration::from_millis(750)));
    }

    #[test]
    fn date_over_max_uses_fallback() {
        let hw = strict()
            .with_wait_max(Duration::from_secs(5))
            .with_fallback(WaitStrategy::fixed(Duration::from_secs(2)));
        let e = unavailable(&http_date_from_now(now(), 20));
        let state = AttemptState::new(1, Outcome::Failure(&e), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(2)));
    }

    #[test]
    fn retry_after_default_falls_back_to_exponential() {
        let hw = HeaderWait::retry_after();
        assert_eq!(hw.wait_max(), Some(DEFAULT_RETRY_AFTER_MAX));

        let e = unavailable("garbage");
        let state = AttemptState::new(3, Outcome::Failure(&e), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(4)));

        let ok = unavailable("120");
        let state = AttemptState::new(3, Outcome::Failure(&ok), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(120)));
    }

    #[test]
    fn non_ascii_value_is_invalid() {
        let e = HttpError::status(
            ResponseSnapshot::new(StatusCode::TOO_MANY_REQUESTS)
                .with_header(RETRY_AFTER, HeaderValue::from_bytes(b"\xff12").unwrap()),
        );
        let state = AttemptState::new(1, Outcome::Failure(&e), now());
        assert!(matches!(
            strict().wait(&state),
            Err(Error::InvalidHeaderValue { reason: "not visible ASCII", .. })
        ));

        let hw = strict().with_fallback(WaitStrategy::fixed(Duration::from_secs(7)));
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(7)));
    }

    #[test]
    fn ceiling_and_fallback_can_be_removed() {
        let hw = HeaderWait::retry_after().without_wait_max().without_fallback();
        assert_eq!(hw.wait_max(), None);
        assert!(hw.fallback().is_none());

        let long = unavailable("600");
        let state = AttemptState::new(1, Outcome::Failure(&long), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(600)));

        let garbage = unavailable("soon");
        let state = AttemptState::new(1, Outcome::Failure(&garbage), now());
        assert!(matches!(hw.wait(&state), Err(Error::InvalidHeaderValue { .. })));
    }

    #[test]
    fn custom_header_name() {
        let name = HeaderName::from_static("x-ratelimit-reset-after");
        let hw = HeaderWait::new(name.clone());
        let e = HttpError::status(
            ResponseSnapshot::new(StatusCode::TOO_MANY_REQUESTS)
                .with_header(name, HeaderValue::from_static("9")),
        );
        let state = AttemptState::new(1, Outcome::Failure(&e), now());
        assert_eq!(hw.wait(&state), Ok(Duration::from_secs(9)));
    }
}
