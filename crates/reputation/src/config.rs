use std::time::Duration;

use nomad_cache::CacheConfig;
use nomad_score::{AnomalyConfig, LevelThresholds, ScoreWeights, SuggestionConfig};
use serde::{Deserialize, Serialize};

use crate::RetryConfig;

/// Configuration of the reputation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub weights: ScoreWeights,
    pub cache: CacheConfig,
    pub anomaly: AnomalyConfig,
    pub suggestions: SuggestionConfig,
    /// Tiers reported in user profiles.
    pub levels: LevelThresholds,
    pub retry: RetryConfig,
    /// Deadline for a single activity source call (default: 30).
    pub fetch_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            cache: CacheConfig::default(),
            anomaly: AnomalyConfig::default(),
            suggestions: SuggestionConfig::default(),
            levels: LevelThresholds::default(),
            retry: RetryConfig::default(),
            fetch_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_levels(mut self, levels: LevelThresholds) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }
}
