//! Score records: persisted history, current score, ranking and anomaly.

use serde::{Deserialize, Serialize};

use crate::{Address, ScoreBreakdown};

/// A computed score that has not been assigned a sequence yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub address: Address,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Unix milliseconds.
    pub computed_at: u64,
}

impl PendingSnapshot {
    pub fn new(address: Address, breakdown: ScoreBreakdown, computed_at: u64) -> Self {
        Self {
            address,
            score: breakdown.total,
            breakdown,
            computed_at,
        }
    }

    /// Seal into a history record with the sequence assigned by the store.
    pub fn with_sequence(self, sequence: u64) -> ScoreSnapshot {
        ScoreSnapshot {
            address: self.address,
            score: self.score,
            breakdown: self.breakdown,
            computed_at: self.computed_at,
            sequence,
        }
    }
}

/// Append-only history record of a computed score.
///
/// `sequence` starts at 1 and strictly increases per address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub address: Address,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Unix milliseconds.
    pub computed_at: u64,
    pub sequence: u64,
}

/// The current score of an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserScore {
    pub address: Address,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Unix milliseconds.
    pub computed_at: u64,
}

impl From<&PendingSnapshot> for UserScore {
    fn from(pending: &PendingSnapshot) -> Self {
        Self {
            address: pending.address,
            score: pending.score,
            breakdown: pending.breakdown.clone(),
            computed_at: pending.computed_at,
        }
    }
}

impl From<ScoreSnapshot> for UserScore {
    fn from(snapshot: ScoreSnapshot) -> Self {
        Self {
            address: snapshot.address,
            score: snapshot.score,
            breakdown: snapshot.breakdown,
            computed_at: snapshot.computed_at,
        }
    }
}

/// A ranked position on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: Address,
    pub score: f64,
    /// 1-based, strict (no shared ranks).
    pub rank: u64,
    pub computed_at: u64,
}

/// An abnormal swing between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub address: Address,
    /// Sequence of the earlier snapshot.
    pub from_snapshot: u64,
    /// Sequence of the later snapshot.
    pub to_snapshot: u64,
    pub delta: f64,
    pub threshold_used: f64,
}
