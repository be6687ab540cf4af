//! Normalized per-address activity, as read from the indexer.
//!
//! The upstream payload is heterogeneous (fixed, bidding and milestone task
//! lists, dispute votes, decimal-string amounts). It is flattened into
//! [`ActivitySnapshot`] at the source boundary so scoring never has to care
//! which upstream list a record came from.

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::Address;

/// Lifecycle state of a task as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
    Paid,
    Cancelled,
    /// A status this version does not know about.
    #[strum(default)]
    Other(String),
}

impl TaskStatus {
    /// Completed and paid tasks both count as delivered work.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed | Self::Paid)
    }
}

/// Lifecycle state of a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
pub enum DisputeStatus {
    Filed,
    Resolved,
    Distributed,
    #[strum(default)]
    Other(String),
}

impl DisputeStatus {
    /// Whether an award has been decided for the worker.
    ///
    /// A filed dispute reports a worker share of zero until it is resolved,
    /// so only settled disputes carry a meaningful award.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved | Self::Distributed)
    }
}

/// A task the address is assigned to or created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
    /// Reward in the token's smallest unit.
    pub reward: u128,
}

/// A milestone-payment task assigned to the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
    pub completed_milestones: u32,
    pub total_milestones: u32,
}

impl MilestoneTaskRecord {
    /// Fraction of milestones delivered, or `neutral` when the task has none.
    pub fn progress(&self, neutral: f64) -> f64 {
        if self.total_milestones == 0 {
            return neutral;
        }
        (self.completed_milestones as f64 / self.total_milestones as f64).clamp(0.0, 1.0)
    }
}

/// A single admin vote on a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeVote {
    /// Stake the voting admin has bonded.
    pub admin_stake: u128,
    /// Worker share the admin voted for.
    pub worker_share: u128,
}

/// A dispute the address is party to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeRecord {
    pub dispute_id: String,
    pub task_id: String,
    pub status: DisputeStatus,
    /// Amount under dispute.
    pub reward_amount: u128,
    /// Amount awarded to the worker on resolution.
    pub worker_share: u128,
    pub votes: Vec<DisputeVote>,
}

impl DisputeRecord {
    /// Fraction of the disputed reward awarded to the worker, in `[0, 1]`.
    ///
    /// A dispute over a zero reward is neutral (0.5).
    pub fn awarded_worker_share(&self) -> f64 {
        if self.reward_amount == 0 {
            return 0.5;
        }
        (self.worker_share as f64 / self.reward_amount as f64).clamp(0.0, 1.0)
    }

    /// Total admin stake behind the votes on this dispute.
    pub fn total_stake(&self) -> u128 {
        self.votes
            .iter()
            .fold(0u128, |acc, vote| acc.saturating_add(vote.admin_stake))
    }

    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}

/// A bid placed by the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub bid_id: String,
    pub task_id: String,
    pub amount: u128,
    /// Estimated delivery time in seconds.
    pub estimated_time: u64,
}

/// Immutable point-in-time aggregate of an address's on-chain activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub address: Address,
    /// Every task assigned to the address, milestone tasks included.
    pub assigned_tasks: Vec<TaskRecord>,
    pub created_tasks: Vec<TaskRecord>,
    pub milestone_tasks: Vec<MilestoneTaskRecord>,
    /// Disputes where the address is the worker.
    pub worker_disputes: Vec<DisputeRecord>,
    /// Disputes where the address is the task creator.
    pub creator_disputes: Vec<DisputeRecord>,
    pub bids: Vec<BidRecord>,
    /// Unix milliseconds at which the snapshot was fetched.
    pub fetched_at: u64,
}

impl ActivitySnapshot {
    /// Snapshot with no recorded activity.
    pub fn empty(address: Address, fetched_at: u64) -> Self {
        Self {
            address,
            assigned_tasks: Vec::new(),
            created_tasks: Vec::new(),
            milestone_tasks: Vec::new(),
            worker_disputes: Vec::new(),
            creator_disputes: Vec::new(),
            bids: Vec::new(),
            fetched_at,
        }
    }

    pub fn total_assigned(&self) -> usize {
        self.assigned_tasks.len()
    }

    pub fn completed_assigned(&self) -> usize {
        self.assigned_tasks
            .iter()
            .filter(|task| task.status.is_completed())
            .count()
    }

    /// Worker disputes that have an award decided.
    pub fn settled_worker_disputes(&self) -> impl Iterator<Item = &DisputeRecord> {
        self.worker_disputes.iter().filter(|d| d.is_settled())
    }

    /// Raw activity counts.
    pub fn stats(&self) -> UserStats {
        UserStats {
            address: self.address,
            total_assigned: self.total_assigned() as u64,
            completed_assigned: self.completed_assigned() as u64,
            milestone_tasks: self.milestone_tasks.len() as u64,
            completed_milestones: self
                .milestone_tasks
                .iter()
                .map(|t| u64::from(t.completed_milestones))
                .sum(),
            created_tasks: self.created_tasks.len() as u64,
            worker_disputes: self.worker_disputes.len() as u64,
            settled_worker_disputes: self.settled_worker_disputes().count() as u64,
            creator_disputes: self.creator_disputes.len() as u64,
            bids: self.bids.len() as u64,
            fetched_at: self.fetched_at,
        }
    }
}

/// Raw activity counts for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub address: Address,
    pub total_assigned: u64,
    pub completed_assigned: u64,
    pub milestone_tasks: u64,
    pub completed_milestones: u64,
    pub created_tasks: u64,
    pub worker_disputes: u64,
    pub settled_worker_disputes: u64,
    pub creator_disputes: u64,
    pub bids: u64,
    pub fetched_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn task(status: TaskStatus) -> TaskRecord {
        TaskRecord {
            task_id: "1".into(),
            status,
            reward: 100,
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(TaskStatus::from_str("Paid").unwrap(), TaskStatus::Paid);
        assert_eq!(
            TaskStatus::from_str("Frozen").unwrap(),
            TaskStatus::Other("Frozen".into())
        );
        assert_eq!(
            DisputeStatus::from_str("Distributed").unwrap(),
            DisputeStatus::Distributed
        );
    }

    #[test]
    fn test_completed_counts() {
        let mut snapshot = ActivitySnapshot::empty(Address::ZERO, 0);
        snapshot.assigned_tasks = vec![
            task(TaskStatus::Completed),
            task(TaskStatus::Paid),
            task(TaskStatus::InProgress),
            task(TaskStatus::Cancelled),
        ];

        assert_eq!(snapshot.total_assigned(), 4);
        assert_eq!(snapshot.completed_assigned(), 2);
    }

    #[test]
    fn test_milestone_progress() {
        let mut record = MilestoneTaskRecord {
            task_id: "7".into(),
            status: TaskStatus::InProgress,
            completed_milestones: 1,
            total_milestones: 4,
        };
        assert_eq!(record.progress(0.5), 0.25);

        record.total_milestones = 0;
        assert_eq!(record.progress(0.5), 0.5);
    }

    #[test]
    fn test_dispute_share_and_stake() {
        let dispute = DisputeRecord {
            dispute_id: "1".into(),
            task_id: "1".into(),
            status: DisputeStatus::Resolved,
            reward_amount: 1_000,
            worker_share: 300,
            votes: vec![
                DisputeVote {
                    admin_stake: 10,
                    worker_share: 300,
                },
                DisputeVote {
                    admin_stake: 5,
                    worker_share: 200,
                },
            ],
        };

        assert!((dispute.awarded_worker_share() - 0.3).abs() < 1e-9);
        assert_eq!(dispute.total_stake(), 15);
        assert!(dispute.is_settled());

        let zero_reward = DisputeRecord {
            reward_amount: 0,
            ..dispute
        };
        assert_eq!(zero_reward.awarded_worker_share(), 0.5);
    }

    #[test]
    fn test_stats_only_count_settled_disputes() {
        let mut snapshot = ActivitySnapshot::empty(Address::ZERO, 42);
        let filed = DisputeRecord {
            dispute_id: "1".into(),
            task_id: "1".into(),
            status: DisputeStatus::Filed,
            reward_amount: 10,
            worker_share: 0,
            votes: Vec::new(),
        };
        let resolved = DisputeRecord {
            status: DisputeStatus::Resolved,
            ..filed.clone()
        };
        snapshot.worker_disputes = vec![filed, resolved];

        let stats = snapshot.stats();
        assert_eq!(stats.worker_disputes, 2);
        assert_eq!(stats.settled_worker_disputes, 1);
        assert_eq!(stats.fetched_at, 42);
    }
}
