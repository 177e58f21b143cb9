#![allow(dead_code)]

pub mod scripted_server;

use chrono::{DateTime, TimeZone, Utc};
use http::header::{HeaderValue, RETRY_AFTER};
use http::StatusCode;
use retryhttp::{HttpError, ResponseSnapshot};

/// Fixed, whole-second start time for manual clocks.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn rate_limited(retry_after: &str) -> HttpError {
    HttpError::status(
        ResponseSnapshot::new(StatusCode::TOO_MANY_REQUESTS)
            .with_header(RETRY_AFTER, HeaderValue::from_str(retry_after).unwrap()),
    )
}

/// `503 Service Unavailable`, optionally announcing when to come back.
pub fn scheduled_downtime(retry_after: Option<&str>) -> HttpError {
    let mut snapshot = ResponseSnapshot::new(StatusCode::SERVICE_UNAVAILABLE);
    if let Some(value) = retry_after {
        snapshot = snapshot.with_header(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
    }
    HttpError::status(snapshot)
}
