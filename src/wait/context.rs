//! Context-aware wait: one strategy per failure category.

use std::time::Duration;

use crate::error::Result;
use crate::outcome::AttemptState;
use crate::retry::{Classifier, FailureCategory};

use super::WaitStrategy;

/// Classifies the outcome and delegates to that category's strategy.
///
/// Success and unclassified failures wait zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextAwareWait {
    classifier: Classifier,
    server_errors: WaitStrategy,
    network_errors: WaitStrategy,
    timeouts: WaitStrategy,
    rate_limited: WaitStrategy,
}

impl Default for ContextAwareWait {
    fn default() -> Self {
        Self {
            classifier: Classifier::default(),
            server_errors: WaitStrategy::exponential_jitter(),
            network_errors: WaitStrategy::exponential(),
            timeouts: WaitStrategy::exponential_jitter(),
            rate_limited: WaitStrategy::rate_limited(),
        }
    }
}

impl ContextAwareWait {
    pub fn new(
        classifier: Classifier,
        server_errors: WaitStrategy,
        network_errors: WaitStrategy,
        timeouts: WaitStrategy,
        rate_limited: WaitStrategy,
    ) -> Self {
        Self {
            classifier,
            server_errors,
            network_errors,
            timeouts,
            rate_limited,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_server_errors(mut self, wait: WaitStrategy) -> Self {
        self.server_errors = wait;
        self
    }

    pub fn with_network_errors(mut self, wait: WaitStrategy) -> Self {
        self.network_errors = wait;
        self
    }

    pub fn with_timeouts(mut self, wait: WaitStrategy) -> Self {
        self.timeouts = wait;
        self
    }

    pub fn with_rate_limited(mut self, wait: WaitStrategy) -> Self {
        self.rate_limited = wait;
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn strategy_for(&self, category: FailureCategory) -> Option<&WaitStrategy> {
        match category {
            FailureCategory::ServerError => Some(&self.server_errors),
            FailureCategory::NetworkError => Some(&self.network_errors),
            FailureCategory::Timeout => Some(&self.timeouts),
            FailureCategory::RateLimited => Some(&self.rate_limited),
            FailureCategory::Unclassified => None,
        }
    }

    pub fn wait(&self, state: &AttemptState<'_>) -> Result<Duration> {
        let category = self.classifier.classify(state.outcome);
        match self.strategy_for(category) {
            Some(strategy) => {
                let wait = strategy.wait(state)?;
                tracing::debug!(?category, attempt = state.attempt, ?wait, "computed wait");
                Ok(wait)
            }
            None => Ok(Duration::ZERO),
        }
    }
}
