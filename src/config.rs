use anyhow::{Context, Result};
use http::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;
use crate::outcome::ErrorKind;
use crate::retry::{
    RateLimitDetection, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_SERVER_ERROR_CODES,
};
use crate::wait::{ExponentialBackoff, HeaderWait, WaitStrategy};

/// Exponential backoff parameters in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialConfig {
    /// Delay after the first attempt (e.g. 0.25 = 250ms).
    pub multiplier_secs: f64,
    /// Growth factor per attempt.
    pub base: u32,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for ExponentialConfig {
    fn default() -> Self {
        let b = ExponentialBackoff::default();
        Self {
            multiplier_secs: b.multiplier.as_secs_f64(),
            base: b.base,
            min_secs: b.min.as_secs_f64(),
            max_secs: b.max.as_secs_f64(),
        }
    }
}

/// One wait strategy, tagged by `strategy = "..."` in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum WaitConfig {
    Fixed {
        secs: f64,
    },
    Exponential(ExponentialConfig),
    ExponentialJitter(ExponentialConfig),
    Header {
        header: String,
        #[serde(default)]
        wait_max_secs: Option<f64>,
        /// Without a fallback, header problems abort the retry loop.
        #[serde(default)]
        fallback: Option<Box<WaitConfig>>,
    },
}

impl WaitConfig {
    /// `Retry-After` capped at 120s with exponential fallback.
    pub fn retry_after() -> Self {
        WaitConfig::Header {
            header: "Retry-After".to_string(),
            wait_max_secs: Some(crate::wait::DEFAULT_RETRY_AFTER_MAX.as_secs_f64()),
            fallback: Some(Box::new(WaitConfig::Exponential(ExponentialConfig::default()))),
        }
    }

    pub fn to_strategy(&self) -> std::result::Result<WaitStrategy, Error> {
        Ok(match self {
            WaitConfig::Fixed { secs } => WaitStrategy::Fixed(secs_to_duration("secs", *secs)?),
            WaitConfig::Exponential(c) => WaitStrategy::Exponential(c.to_backoff()?),
            WaitConfig::ExponentialJitter(c) => WaitStrategy::ExponentialJitter(c.to_backoff()?),
            WaitConfig::Header {
                header,
                wait_max_secs,
                fallback,
            } => {
                let name = HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                    Error::Configuration(format!("invalid header name {:?}", header))
                })?;
                let mut hw = HeaderWait::new(name);
                if let Some(max) = wait_max_secs {
                    hw = hw.with_wait_max(secs_to_duration("wait_max_secs", *max)?);
                }
                if let Some(fallback) = fallback {
                    hw = hw.with_fallback(fallback.to_strategy()?);
                }
                WaitStrategy::HeaderDerived(hw)
            }
        })
    }
}

impl ExponentialConfig {
    fn to_backoff(&self) -> std::result::Result<ExponentialBackoff, Error> {
        Ok(ExponentialBackoff {
            multiplier: secs_to_duration("multiplier_secs", self.multiplier_secs)?,
            base: self.base,
            min: secs_to_duration("min_secs", self.min_secs)?,
            max: secs_to_duration("max_secs", self.max_secs)?,
        })
    }
}

fn secs_to_duration(field: &str, secs: f64) -> std::result::Result<Duration, Error> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        Error::Configuration(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, secs
        ))
    })
}

/// Per-category wait strategies (`[wait]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfigs {
    pub server_errors: WaitConfig,
    pub network_errors: WaitConfig,
    pub timeouts: WaitConfig,
    pub rate_limited: WaitConfig,
}

impl Default for WaitConfigs {
    fn default() -> Self {
        Self {
            server_errors: WaitConfig::ExponentialJitter(ExponentialConfig::default()),
            network_errors: WaitConfig::Exponential(ExponentialConfig::default()),
            timeouts: WaitConfig::ExponentialJitter(ExponentialConfig::default()),
            rate_limited: WaitConfig::retry_after(),
        }
    }
}

/// Retry policy description, e.g. loaded from a `retry.toml`.
///
/// Every field is optional in TOML; missing ones take the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Maximum number of attempts (including the first) for the retry loop.
    pub max_attempts: u32,
    pub retry_server_errors: bool,
    pub retry_network_errors: bool,
    pub retry_timeouts: bool,
    pub retry_rate_limited: bool,
    /// Statuses treated as server errors.
    pub server_error_codes: Vec<u16>,
    pub network_errors: Vec<ErrorKind>,
    pub timeouts: Vec<ErrorKind>,
    /// "too_many_requests" (status 429) or "retry_after_header".
    pub rate_limit_detection: RateLimitDetection,
    pub wait: WaitConfigs,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut network_errors: Vec<_> = ErrorKind::default_network_errors().into_iter().collect();
        network_errors.sort_by_key(|k| *k as u8);
        let mut timeouts: Vec<_> = ErrorKind::default_timeouts().into_iter().collect();
        timeouts.sort_by_key(|k| *k as u8);
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_server_errors: true,
            retry_network_errors: true,
            retry_timeouts: true,
            retry_rate_limited: true,
            server_error_codes: DEFAULT_SERVER_ERROR_CODES.to_vec(),
            network_errors,
            timeouts,
            rate_limit_detection: RateLimitDetection::default(),
            wait: WaitConfigs::default(),
        }
    }
}

impl PolicyConfig {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: PolicyConfig = toml::from_str(data).context("invalid retry policy config")?;
        Ok(cfg)
    }

    /// Load a policy description from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read retry config: {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)?;
        tracing::debug!("loaded retry policy config from {}", path.display());
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn build_policy(&self) -> std::result::Result<RetryPolicy, Error> {
        if self.max_attempts == 0 {
            return Err(Error::Configuration("max_attempts must be at least 1".to_string()));
        }
        RetryPolicy::builder()
            .retry_server_errors(self.retry_server_errors)
            .retry_network_errors(self.retry_network_errors)
            .retry_timeouts(self.retry_timeouts)
            .retry_rate_limited(self.retry_rate_limited)
            .server_error_codes(self.server_error_codes.iter().copied())
            .network_errors(self.network_errors.iter().copied())
            .timeouts(self.timeouts.iter().copied())
            .rate_limit_detection(self.rate_limit_detection)
            .wait_server_errors(self.wait.server_errors.to_strategy()?)
            .wait_network_errors(self.wait.network_errors.to_strategy()?)
            .wait_timeouts(self.wait.timeouts.to_strategy()?)
            .wait_rate_limited(self.wait.rate_limited.to_strategy()?)
            .build()
    }
}
