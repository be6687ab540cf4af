//! Coarse reputation tiers.

use serde::{Deserialize, Serialize};

/// Tier of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreLevel {
    Poor,
    Good,
    Excellent,
}

/// Score thresholds of the tiers. A score must exceed a threshold to reach
/// the tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    /// Default: 400.
    pub good_above: f64,
    /// Default: 700.
    pub excellent_above: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            good_above: 400.0,
            excellent_above: 700.0,
        }
    }
}

impl LevelThresholds {
    pub fn level(&self, score: f64) -> ScoreLevel {
        if score > self.excellent_above {
            ScoreLevel::Excellent
        } else if score > self.good_above {
            ScoreLevel::Good
        } else {
            ScoreLevel::Poor
        }
    }
}
