//! Attempt outcomes and the adapter layer between HTTP clients and the policy.
//!
//! The policy never sees a concrete client error. Applications implement
//! [`HttpFailure`] once for their error type (or use [`HttpError`]), translating
//! whatever their client reports into an [`ErrorKind`] and an optional
//! [`ResponseSnapshot`].

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Transport-level taxonomy of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Could not establish a connection (refused, DNS, proxy).
    Connect,
    /// Connection failed while reading the response.
    Read,
    /// Connection failed while sending the request.
    Write,
    ConnectTimeout,
    ReadTimeout,
    WriteTimeout,
    /// Timed out waiting for a pooled connection.
    PoolTimeout,
    /// The server answered with an error status; see the response snapshot.
    Status,
    /// Anything else (TLS, decoding, invalid URL, ...).
    Other,
}

impl ErrorKind {
    pub const fn is_timeout(self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectTimeout
                | ErrorKind::ReadTimeout
                | ErrorKind::WriteTimeout
                | ErrorKind::PoolTimeout
        )
    }

    /// Kinds treated as network errors unless overridden.
    pub fn default_network_errors() -> HashSet<ErrorKind> {
        [ErrorKind::Connect, ErrorKind::Read, ErrorKind::Write]
            .into_iter()
            .collect()
    }

    /// Kinds treated as timeouts unless overridden.
    pub fn default_timeouts() -> HashSet<ErrorKind> {
        [
            ErrorKind::ConnectTimeout,
            ErrorKind::ReadTimeout,
            ErrorKind::WriteTimeout,
            ErrorKind::PoolTimeout,
        ]
        .into_iter()
        .collect()
    }
}

/// Status code and headers of an HTTP response, captured at failure time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseSnapshot {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Add a header (appending if the name is already present).
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Snapshot an `http::Response` without consuming its body.
    pub fn from_response<B>(response: &http::Response<B>) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }

    /// Build a snapshot from raw header lines as delivered by a client's header
    /// callback (status line first, then `Name: value` lines).
    ///
    /// When redirects were followed, the last status line wins and headers seen
    /// before it are discarded. Returns `None` if no status line was found.
    pub fn from_header_lines(lines: &[String]) -> Option<Self> {
        let mut status = None;
        let mut headers = HeaderMap::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("HTTP/") {
                let code = line
                    .split_whitespace()
                    .nth(1)
                    .and_then(|c| c.parse::<u16>().ok())
                    .and_then(|c| StatusCode::from_u16(c).ok());
                if code.is_some() {
                    status = code;
                    headers.clear();
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(name.trim().as_bytes()),
                    HeaderValue::from_str(value.trim()),
                ) else {
                    tracing::debug!(line, "skipping malformed header line");
                    continue;
                };
                headers.append(name, value);
            }
        }

        status.map(|status| Self { status, headers })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive lookup of the first value for `name`.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }
}

/// Adapter implemented once per HTTP client error type.
pub trait HttpFailure: fmt::Debug {
    fn error_kind(&self) -> ErrorKind;

    /// The response, if the failure came from an HTTP error status.
    fn response(&self) -> Option<&ResponseSnapshot>;
}

impl<T: HttpFailure + ?Sized> HttpFailure for &T {
    fn error_kind(&self) -> ErrorKind {
        (**self).error_kind()
    }

    fn response(&self) -> Option<&ResponseSnapshot> {
        (**self).response()
    }
}

impl<T: HttpFailure + ?Sized> HttpFailure for Box<T> {
    fn error_kind(&self) -> ErrorKind {
        (**self).error_kind()
    }

    fn response(&self) -> Option<&ResponseSnapshot> {
        (**self).response()
    }
}

/// Ready-made failure type for applications without their own error enum.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    kind: ErrorKind,
    response: Option<ResponseSnapshot>,
    message: String,
}

impl HttpError {
    /// A transport failure with no response (connect, read, timeout, ...).
    pub fn transport(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            response: None,
            message: message.into(),
        }
    }

    /// An error-status response.
    pub fn status(response: ResponseSnapshot) -> Self {
        let message = match response.status().canonical_reason() {
            Some(reason) => format!("HTTP {} {}", response.status().as_u16(), reason),
            None => format!("HTTP {}", response.status().as_u16()),
        };
        Self {
            kind: ErrorKind::Status,
            response: Some(response),
            message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl HttpFailure for HttpError {
    fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    fn response(&self) -> Option<&ResponseSnapshot> {
        self.response.as_ref()
    }
}

/// Result of one attempt, as seen by the policy.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success,
    Failure(&'a dyn HttpFailure),
}

impl<'a> Outcome<'a> {
    pub fn from_result<T, E: HttpFailure + 'a>(result: &'a Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::Failure(e),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn failure(&self) -> Option<&'a dyn HttpFailure> {
        match *self {
            Outcome::Success => None,
            Outcome::Failure(f) => Some(f),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.error_kind())
    }

    pub fn response(&self) -> Option<&'a ResponseSnapshot> {
        self.failure().and_then(|f| f.response())
    }
}

/// Everything a wait strategy may consult for one decision.
#[derive(Debug, Clone, Copy)]
pub struct AttemptState<'a> {
    /// 1-based number of the attempt that just finished.
    pub attempt: u32,
    pub outcome: Outcome<'a>,
    /// Clock reading taken by the executor for this decision.
    pub now: DateTime<Utc>,
}

impl<'a> AttemptState<'a> {
    pub fn new(attempt: u32, outcome: Outcome<'a>, now: DateTime<Utc>) -> Self {
        Self {
            attempt,
            outcome,
            now,
        }
    }
}
