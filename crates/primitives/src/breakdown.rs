//! Weighted decomposition of a reputation score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

/// Tolerance for floating point invariant checks.
const EPSILON: f64 = 1e-6;

/// Identifies a score component.
///
/// The declaration order is the canonical component order, used as the
/// final tie-break wherever components are ranked.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentId {
    Completion,
    MilestoneProgress,
    DisputeFairness,
    BiddingActivity,
}

/// One component of a [`ScoreBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Unweighted input (a ratio, a fairness value or a count).
    pub raw: f64,
    /// Points this component contributes to the total.
    pub weighted_points: f64,
    /// Lowest attainable points (negative only for dispute fairness).
    pub min_points: f64,
    /// Highest attainable points.
    pub max_points: f64,
}

impl ComponentScore {
    /// Points still attainable, measured against the maximum.
    pub fn headroom(&self) -> f64 {
        self.max_points - self.weighted_points
    }

    pub fn in_bounds(&self) -> bool {
        self.weighted_points >= self.min_points - EPSILON
            && self.weighted_points <= self.max_points + EPSILON
    }
}

/// Score decomposed into weighted components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: BTreeMap<ComponentId, ComponentScore>,
    pub total: f64,
}

/// A breakdown that violates its arithmetic invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BreakdownViolation {
    #[error("component {0:?} is missing")]
    MissingComponent(ComponentId),
    #[error("component {id:?} has {points} points outside [{min}, {max}]")]
    OutOfBounds {
        id: ComponentId,
        points: f64,
        min: f64,
        max: f64,
    },
    #[error("component {0:?} is not a finite number")]
    NonFinite(ComponentId),
    #[error("total {total} does not match component sum {expected}")]
    TotalMismatch { total: f64, expected: f64 },
}

impl ScoreBreakdown {
    pub fn component(&self, id: ComponentId) -> Option<&ComponentScore> {
        self.components.get(&id)
    }

    /// Weighted points of a component, 0 if absent.
    pub fn points(&self, id: ComponentId) -> f64 {
        self.component(id).map_or(0.0, |c| c.weighted_points)
    }

    /// Sum of all weighted component points.
    pub fn weighted_sum(&self) -> f64 {
        self.components.values().map(|c| c.weighted_points).sum()
    }

    /// Check that every component is present and bounded and that the total
    /// equals the component sum clamped to `[total_min, total_max]`.
    pub fn validate(&self, total_min: f64, total_max: f64) -> Result<(), BreakdownViolation> {
        for id in <ComponentId as strum::IntoEnumIterator>::iter() {
            let component = self
                .component(id)
                .ok_or(BreakdownViolation::MissingComponent(id))?;
            if !component.weighted_points.is_finite() || !component.raw.is_finite() {
                return Err(BreakdownViolation::NonFinite(id));
            }
            if !component.in_bounds() {
                return Err(BreakdownViolation::OutOfBounds {
                    id,
                    points: component.weighted_points,
                    min: component.min_points,
                    max: component.max_points,
                });
            }
        }

        let expected = self.weighted_sum().clamp(total_min, total_max);
        if (self.total - expected).abs() > EPSILON {
            return Err(BreakdownViolation::TotalMismatch {
                total: self.total,
                expected,
            });
        }
        Ok(())
    }
}
