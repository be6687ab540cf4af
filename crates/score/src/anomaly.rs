//! Detection of abnormal score swings across history.

use nomad_primitives::{AnomalyFlag, ScoreSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Below this deviation the history is considered flat.
const FLAT_STDDEV: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Number of most recent snapshots inspected (default: 10).
    pub window: usize,
    /// Snapshots required before the statistical test applies (default: 3).
    pub min_history: usize,
    /// Multiplier on the standard deviation of previous deltas (default: 2.5).
    pub k: f64,
    /// Delta threshold used for short or flat histories (default: 150 points).
    pub absolute_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_history: 3,
            k: 2.5,
            absolute_threshold: 150.0,
        }
    }
}

/// Flags the latest score delta when it deviates from the previous deltas.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Inspect the most recent `window` snapshots of one address.
    ///
    /// Order of `history` does not matter; snapshots are ordered by sequence.
    /// Returns `None` when fewer than two snapshots are available.
    pub fn detect(&self, history: &[ScoreSnapshot]) -> Option<AnomalyFlag> {
        let mut ordered: Vec<&ScoreSnapshot> = history.iter().collect();
        ordered.sort_by_key(|s| s.sequence);
        let skip = ordered.len().saturating_sub(self.config.window.max(2));
        let recent: Vec<&ScoreSnapshot> = ordered.into_iter().skip(skip).collect();

        let deltas: Vec<(&ScoreSnapshot, &ScoreSnapshot, f64)> = recent
            .windows(2)
            .filter_map(|pair| match pair {
                [from, to] => Some((*from, *to, to.score - from.score)),
                _ => None,
            })
            .collect();

        let ((from, to, latest), previous) = deltas.split_last()?;

        let threshold = if recent.len() < self.config.min_history {
            self.config.absolute_threshold
        } else {
            let previous: Vec<f64> = previous.iter().map(|(_, _, d)| *d).collect();
            match stddev(&previous) {
                Some(deviation) if deviation > FLAT_STDDEV => self.config.k * deviation,
                _ => self.config.absolute_threshold,
            }
        };

        debug!(
            address = %to.address,
            delta = latest,
            threshold,
            "evaluated latest score delta"
        );

        (latest.abs() > threshold).then(|| AnomalyFlag {
            address: to.address,
            from_snapshot: from.sequence,
            to_snapshot: to.sequence,
            delta: *latest,
            threshold_used: threshold,
        })
    }
}

/// Population standard deviation, `None` for an empty slice.
fn stddev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_primitives::{Address, ScoreBreakdown};
    use std::collections::BTreeMap;

    fn history(scores: &[f64]) -> Vec<ScoreSnapshot> {
        scores
            .iter()
            .enumerate()
            .map(|(i, score)| ScoreSnapshot {
                address: Address::ZERO,
                score: *score,
                breakdown: ScoreBreakdown {
                    components: BTreeMap::new(),
                    total: *score,
                },
                computed_at: i as u64 * 1_000,
                sequence: i as u64 + 1,
            })
            .collect()
    }

    #[test]
    fn test_no_flag_without_deltas() {
        let detector = AnomalyDetector::default();
        assert!(detector.detect(&[]).is_none());
        assert!(detector.detect(&history(&[500.0])).is_none());
    }

    #[test]
    fn test_short_history_uses_absolute_threshold() {
        let detector = AnomalyDetector::default();

        assert!(detector.detect(&history(&[300.0, 400.0])).is_none());

        let flag = detector.detect(&history(&[300.0, 520.0])).unwrap();
        assert_eq!(flag.from_snapshot, 1);
        assert_eq!(flag.to_snapshot, 2);
        assert_eq!(flag.delta, 220.0);
        assert_eq!(flag.threshold_used, 150.0);
    }

    #[test]
    fn test_statistical_threshold() {
        let detector = AnomalyDetector::default();

        // Previous deltas 10, -10, 10, -10: stddev 10, threshold 25.
        let steady = history(&[500.0, 510.0, 500.0, 510.0, 500.0, 520.0]);
        assert!(detector.detect(&steady).is_none());

        let spike = history(&[500.0, 510.0, 500.0, 510.0, 500.0, 540.0]);
        let flag = detector.detect(&spike).unwrap();
        assert_eq!(flag.delta, 40.0);
        assert!((flag.threshold_used - 25.0).abs() < 1e-9);
        assert_eq!(flag.to_snapshot, 6);
    }

    #[test]
    fn test_flat_history_falls_back_to_absolute() {
        let detector = AnomalyDetector::default();

        let small = history(&[500.0, 500.0, 500.0, 501.0]);
        assert!(detector.detect(&small).is_none());

        let large = history(&[500.0, 500.0, 500.0, 700.0]);
        assert_eq!(detector.detect(&large).unwrap().threshold_used, 150.0);
    }

    #[test]
    fn test_order_and_window() {
        let detector = AnomalyDetector::new(AnomalyConfig {
            window: 3,
            ..Default::default()
        });

        // Newest-first input, and an old swing outside the window.
        let mut snapshots = history(&[0.0, 900.0, 900.0, 910.0, 900.0]);
        snapshots.reverse();
        assert!(detector.detect(&snapshots).is_none());
    }
}
