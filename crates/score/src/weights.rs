//! Weighting policy for the score components.

use nomad_primitives::ComponentId;
use serde::{Deserialize, Serialize};

/// Points and normalization constants for each score component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Maximum points for task completion (default: 400).
    pub completion_max: f64,
    /// Maximum points for milestone progress (default: 200).
    pub milestone_max: f64,
    /// Dispute fairness spans `[-dispute_max, dispute_max]` (default: 300).
    pub dispute_max: f64,
    /// Maximum points for bidding activity (default: 100).
    pub bidding_max: f64,
    /// Ratio used when a ratio has no data (default: 0.5).
    pub neutral_ratio: f64,
    /// Number of bids that earns full bidding points (default: 10).
    pub bid_saturation: u32,
    /// Lower clamp for the total (default: -300).
    pub total_min: f64,
    /// Upper clamp for the total (default: 1000).
    pub total_max: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completion_max: 400.0,
            milestone_max: 200.0,
            dispute_max: 300.0,
            bidding_max: 100.0,
            neutral_ratio: 0.5,
            bid_saturation: 10,
            total_min: -300.0,
            total_max: 1000.0,
        }
    }
}

impl ScoreWeights {
    pub fn with_completion_max(mut self, points: f64) -> Self {
        self.completion_max = points;
        self
    }

    pub fn with_dispute_max(mut self, points: f64) -> Self {
        self.dispute_max = points;
        self
    }

    pub fn with_bid_saturation(mut self, bids: u32) -> Self {
        self.bid_saturation = bids;
        self
    }

    pub fn with_neutral_ratio(mut self, ratio: f64) -> Self {
        self.neutral_ratio = ratio;
        self
    }

    /// `(min, max)` points for a component.
    pub fn bounds(&self, id: ComponentId) -> (f64, f64) {
        match id {
            ComponentId::Completion => (0.0, self.completion_max),
            ComponentId::MilestoneProgress => (0.0, self.milestone_max),
            ComponentId::DisputeFairness => (-self.dispute_max, self.dispute_max),
            ComponentId::BiddingActivity => (0.0, self.bidding_max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoreWeights::default();
        assert_eq!(weights.bounds(ComponentId::Completion), (0.0, 400.0));
        assert_eq!(weights.bounds(ComponentId::DisputeFairness), (-300.0, 300.0));
        assert_eq!(weights.total_min, -300.0);
        assert_eq!(weights.total_max, 1000.0);
    }

    #[test]
    fn test_builder() {
        let weights = ScoreWeights::default()
            .with_completion_max(500.0)
            .with_bid_saturation(20);
        assert_eq!(weights.completion_max, 500.0);
        assert_eq!(weights.bid_saturation, 20);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let weights: ScoreWeights = serde_json::from_str(r#"{"bidding_max": 50.0}"#).unwrap();
        assert_eq!(weights.bidding_max, 50.0);
        assert_eq!(weights.completion_max, 400.0);
    }
}
