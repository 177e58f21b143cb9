//! Exponential backoff, plain and fully jittered.

use std::time::Duration;

use rand::Rng;

/// `multiplier * base^(attempt - 1)`, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub multiplier: Duration,
    pub base: u32,
    pub min: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            multiplier: Duration::from_secs(1),
            base: 2,
            min: Duration::ZERO,
            max: Duration::from_secs(60),
        }
    }
}

impl ExponentialBackoff {
    pub fn new(multiplier: Duration, max: Duration) -> Self {
        Self {
            multiplier,
            max,
            ..Self::default()
        }
    }

    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    pub fn with_min(mut self, min: Duration) -> Self {
        self.min = min;
        self
    }

    /// Delay after the given 1-based attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_pow(attempt.saturating_sub(1));
        let raw = self.multiplier.saturating_mul(exp);
        raw.min(self.max).max(self.min)
    }

    /// Uniformly random delay in `[min, delay(attempt)]`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let high = self.delay(attempt);
        if high <= self.min {
            return high;
        }
        rand::thread_rng().gen_range(self.min..=high)
    }
}
