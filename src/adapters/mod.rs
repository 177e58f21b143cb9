//! Adapters from concrete HTTP client errors to [`HttpFailure`](crate::outcome::HttpFailure).

#[cfg(feature = "curl")]
pub mod curl;
