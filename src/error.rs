//! Error type for wait-time computation and policy construction.

use std::time::Duration;

/// Errors raised while deriving a wait or building a policy.
///
/// The three header variants are only seen by callers when the header strategy
/// has no fallback configured; the executor treats them as fatal and does not retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The outcome carried no response, or the response lacked the header.
    #[error("response has no `{header}` header")]
    MissingHeader { header: String },

    /// The header value is neither delta-seconds nor a future HTTP-date.
    #[error("invalid `{header}` header value {value:?}: {reason}")]
    InvalidHeaderValue {
        header: String,
        value: String,
        reason: &'static str,
    },

    /// The header asked for a longer wait than the configured ceiling.
    #[error("`{header}` asks for {wait:?}, above the {max:?} ceiling")]
    WaitExceedsMax {
        header: String,
        wait: Duration,
        max: Duration,
    },

    /// The policy cannot be built (e.g. every category disabled).
    #[error("invalid retry configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// True for the errors a header strategy recovers from via its fallback.
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            Error::MissingHeader { .. }
                | Error::InvalidHeaderValue { .. }
                | Error::WaitExceedsMax { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
