//! Activity snapshot to score breakdown.

use std::collections::BTreeMap;

use nomad_primitives::{ActivitySnapshot, ComponentId, ComponentScore, ScoreBreakdown};

use crate::ScoreWeights;

/// Deterministic scoring of an activity snapshot.
///
/// Identical input always yields an identical breakdown. Ratios with no data
/// fall back to the neutral ratio so new participants are not penalized for
/// the absence of history.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    weights: ScoreWeights,
}

impl ScoreCalculator {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn calculate(&self, activity: &ActivitySnapshot) -> ScoreBreakdown {
        let components = BTreeMap::from([
            (ComponentId::Completion, self.completion(activity)),
            (ComponentId::MilestoneProgress, self.milestone_progress(activity)),
            (ComponentId::DisputeFairness, self.dispute_fairness(activity)),
            (ComponentId::BiddingActivity, self.bidding_activity(activity)),
        ]);

        let total = components
            .values()
            .map(|c| c.weighted_points)
            .sum::<f64>()
            .clamp(self.weights.total_min, self.weights.total_max);

        ScoreBreakdown { components, total }
    }

    fn component(&self, id: ComponentId, raw: f64, points: f64) -> ComponentScore {
        let (min_points, max_points) = self.weights.bounds(id);
        ComponentScore {
            raw,
            weighted_points: points.clamp(min_points, max_points),
            min_points,
            max_points,
        }
    }

    fn completion(&self, activity: &ActivitySnapshot) -> ComponentScore {
        let total = activity.total_assigned();
        let ratio = if total == 0 {
            self.weights.neutral_ratio
        } else {
            activity.completed_assigned() as f64 / total as f64
        };
        self.component(
            ComponentId::Completion,
            ratio,
            ratio * self.weights.completion_max,
        )
    }

    fn milestone_progress(&self, activity: &ActivitySnapshot) -> ComponentScore {
        let neutral = self.weights.neutral_ratio;
        let ratio = if activity.milestone_tasks.is_empty() {
            neutral
        } else {
            let sum: f64 = activity
                .milestone_tasks
                .iter()
                .map(|task| task.progress(neutral))
                .sum();
            sum / activity.milestone_tasks.len() as f64
        };
        self.component(
            ComponentId::MilestoneProgress,
            ratio,
            ratio * self.weights.milestone_max,
        )
    }

    /// Stake-weighted fairness of settled worker disputes, in `[-1, 1]`.
    ///
    /// Each dispute contributes `2 * awarded_share - 1`, weighted by its admin
    /// stake relative to the stake across all counted disputes. Disputes
    /// weigh equally when no stake was recorded. No disputes is neutral.
    fn dispute_fairness(&self, activity: &ActivitySnapshot) -> ComponentScore {
        let disputes: Vec<_> = activity.settled_worker_disputes().collect();
        if disputes.is_empty() {
            return self.component(ComponentId::DisputeFairness, 0.0, 0.0);
        }

        let total_stake: f64 = disputes.iter().map(|d| d.total_stake() as f64).sum();
        let equal_weight = 1.0 / disputes.len() as f64;

        let fairness: f64 = disputes
            .iter()
            .map(|dispute| {
                let weight = if total_stake > 0.0 {
                    dispute.total_stake() as f64 / total_stake
                } else {
                    equal_weight
                };
                weight * (2.0 * dispute.awarded_worker_share() - 1.0)
            })
            .sum::<f64>()
            .clamp(-1.0, 1.0);

        self.component(
            ComponentId::DisputeFairness,
            fairness,
            fairness * self.weights.dispute_max,
        )
    }

    fn bidding_activity(&self, activity: &ActivitySnapshot) -> ComponentScore {
        let bids = activity.bids.len() as f64;
        let saturation = f64::from(self.weights.bid_saturation.max(1));
        let ratio = (bids / saturation).min(1.0);
        self.component(
            ComponentId::BiddingActivity,
            bids,
            ratio * self.weights.bidding_max,
        )
    }
}
