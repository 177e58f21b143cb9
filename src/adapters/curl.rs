//! Adapter for the curl crate (libcurl).
//!
//! Maps `curl::Error` onto [`ErrorKind`] and raw header lines collected in a
//! `header_function` callback onto a [`ResponseSnapshot`].

use std::fmt;

use crate::outcome::{ErrorKind, HttpFailure, ResponseSnapshot};

/// Classify a curl error into the transport taxonomy.
///
/// libcurl reports one timeout code for every phase; all timeouts map to
/// `ReadTimeout`.
pub fn classify_curl_error(e: &::curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::ReadTimeout;
    }
    if e.is_couldnt_connect() || e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return ErrorKind::Connect;
    }
    if e.is_read_error() || e.is_recv_error() || e.is_got_nothing() || e.is_partial_file() {
        return ErrorKind::Read;
    }
    if e.is_send_error() {
        return ErrorKind::Write;
    }
    ErrorKind::Other
}

/// Failure of a curl transfer: transport error or non-2xx response.
#[derive(Debug)]
pub enum CurlFailure {
    /// Curl reported an error (timeout, connection, etc.).
    Transport(::curl::Error),
    /// HTTP response had a non-2xx status.
    Status(ResponseSnapshot),
}

impl CurlFailure {
    /// Turn the header lines of a completed transfer into `Err` for non-2xx statuses.
    ///
    /// Lines without a parseable status line are treated as success.
    pub fn check_header_lines(lines: &[String]) -> Result<(), CurlFailure> {
        match ResponseSnapshot::from_header_lines(lines) {
            Some(snapshot) if !snapshot.status().is_success() => Err(CurlFailure::Status(snapshot)),
            _ => Ok(()),
        }
    }
}

impl From<::curl::Error> for CurlFailure {
    fn from(e: ::curl::Error) -> Self {
        CurlFailure::Transport(e)
    }
}

impl fmt::Display for CurlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurlFailure::Transport(e) => write!(f, "{}", e),
            CurlFailure::Status(r) => write!(f, "HTTP {}", r.status().as_u16()),
        }
    }
}

impl std::error::Error for CurlFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CurlFailure::Transport(e) => Some(e),
            CurlFailure::Status(_) => None,
        }
    }
}

impl HttpFailure for CurlFailure {
    fn error_kind(&self) -> ErrorKind {
        match self {
            CurlFailure::Transport(e) => classify_curl_error(e),
            CurlFailure::Status(_) => ErrorKind::Status,
        }
    }

    fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            CurlFailure::Transport(_) => None,
            CurlFailure::Status(r) => Some(r),
        }
    }
}
