//! Indexer record shapes and their normalization.
//!
//! The indexer reports amounts and counters as decimal strings and splits
//! tasks over fixed, bidding and milestone-payment lists. [`UserWorkSummary`]
//! mirrors that payload; [`UserWorkSummary::normalize`] flattens it.

use std::str::FromStr;

use nomad_primitives::{
    ActivitySnapshot, Address, BidRecord, DisputeRecord, DisputeStatus, DisputeVote,
    MilestoneTaskRecord, TaskRecord, TaskStatus,
};
use serde::{Deserialize, Serialize};

use crate::{SourceError, SourceResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub reward: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MilestoneTaskSummary {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub completed_milestones_count: String,
    /// Not every indexer deployment exposes the milestone total.
    pub milestones_count: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskSimple {
    pub id: String,
    pub task_id: String,
    pub status: String,
    pub reward: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminRecord {
    pub stake_amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminVoteRecord {
    pub admin: AdminRecord,
    pub worker_share: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisputeSummary {
    pub id: String,
    pub dispute_id: String,
    pub task_id: String,
    pub reward_amount: String,
    pub worker_share: String,
    pub status: String,
    pub votes: Vec<AdminVoteRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BidSummary {
    pub id: String,
    pub task_id: String,
    pub amount: String,
    pub estimated_time: String,
}

/// Per-address work summary as served by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserWorkSummary {
    pub id: String,
    pub address: String,
    pub assigned_tasks: Vec<TaskSummary>,
    pub bidding_task_assigned: Vec<TaskSummary>,
    pub milestone_payment_task_assigned: Vec<MilestoneTaskSummary>,
    pub created_tasks: Vec<TaskSimple>,
    pub bidding_task_created: Vec<TaskSimple>,
    pub milestone_payment_task_created: Vec<TaskSimple>,
    pub worker_disputes: Vec<DisputeSummary>,
    pub creator_disputes: Vec<DisputeSummary>,
    pub bids: Vec<BidSummary>,
}

impl UserWorkSummary {
    /// Whether the summary records no activity at all.
    pub fn is_empty(&self) -> bool {
        self.assigned_tasks.is_empty()
            && self.bidding_task_assigned.is_empty()
            && self.milestone_payment_task_assigned.is_empty()
            && self.created_tasks.is_empty()
            && self.bidding_task_created.is_empty()
            && self.milestone_payment_task_created.is_empty()
            && self.worker_disputes.is_empty()
            && self.creator_disputes.is_empty()
            && self.bids.is_empty()
    }

    /// Flatten into an [`ActivitySnapshot`] for `address`.
    ///
    /// Milestone-payment tasks appear both in the assigned task list and in
    /// the milestone list.
    pub fn normalize(&self, address: Address, fetched_at: u64) -> SourceResult<ActivitySnapshot> {
        let milestone_tasks = self
            .milestone_payment_task_assigned
            .iter()
            .map(|m| {
                let completed = parse_u32(&m.completed_milestones_count, "completedMilestonesCount")?;
                let total = match &m.milestones_count {
                    Some(count) => parse_u32(count, "milestonesCount")?,
                    None => 0,
                };
                Ok(MilestoneTaskRecord {
                    task_id: m.task.task_id.clone(),
                    status: task_status(&m.task.status),
                    completed_milestones: completed,
                    total_milestones: total,
                })
            })
            .collect::<SourceResult<Vec<_>>>()?;

        let assigned_tasks = self
            .assigned_tasks
            .iter()
            .chain(&self.bidding_task_assigned)
            .chain(self.milestone_payment_task_assigned.iter().map(|m| &m.task))
            .map(|t| task_record(&t.task_id, &t.status, &t.reward))
            .collect::<SourceResult<Vec<_>>>()?;

        let created_tasks = self
            .created_tasks
            .iter()
            .chain(&self.bidding_task_created)
            .chain(&self.milestone_payment_task_created)
            .map(|t| task_record(&t.task_id, &t.status, &t.reward))
            .collect::<SourceResult<Vec<_>>>()?;

        let worker_disputes = self
            .worker_disputes
            .iter()
            .map(dispute_record)
            .collect::<SourceResult<Vec<_>>>()?;
        let creator_disputes = self
            .creator_disputes
            .iter()
            .map(dispute_record)
            .collect::<SourceResult<Vec<_>>>()?;

        let bids = self
            .bids
            .iter()
            .map(|b| {
                Ok(BidRecord {
                    bid_id: b.id.clone(),
                    task_id: b.task_id.clone(),
                    amount: parse_amount(&b.amount, "amount")?,
                    estimated_time: parse_u64(&b.estimated_time, "estimatedTime")?,
                })
            })
            .collect::<SourceResult<Vec<_>>>()?;

        Ok(ActivitySnapshot {
            address,
            assigned_tasks,
            created_tasks,
            milestone_tasks,
            worker_disputes,
            creator_disputes,
            bids,
            fetched_at,
        })
    }
}

fn task_status(status: &str) -> TaskStatus {
    // The default variant absorbs unknown statuses, so this never fails.
    TaskStatus::from_str(status).unwrap_or_else(|_| TaskStatus::Other(status.to_owned()))
}

fn dispute_status(status: &str) -> DisputeStatus {
    DisputeStatus::from_str(status).unwrap_or_else(|_| DisputeStatus::Other(status.to_owned()))
}

fn task_record(task_id: &str, status: &str, reward: &str) -> SourceResult<TaskRecord> {
    Ok(TaskRecord {
        task_id: task_id.to_owned(),
        status: task_status(status),
        reward: parse_amount(reward, "reward")?,
    })
}

fn dispute_record(dispute: &DisputeSummary) -> SourceResult<DisputeRecord> {
    let votes = dispute
        .votes
        .iter()
        .map(|vote| {
            Ok(DisputeVote {
                admin_stake: parse_amount(&vote.admin.stake_amount, "stakeAmount")?,
                worker_share: parse_amount(&vote.worker_share, "workerShare")?,
            })
        })
        .collect::<SourceResult<Vec<_>>>()?;

    Ok(DisputeRecord {
        dispute_id: dispute.dispute_id.clone(),
        task_id: dispute.task_id.clone(),
        status: dispute_status(&dispute.status),
        reward_amount: parse_amount(&dispute.reward_amount, "rewardAmount")?,
        worker_share: parse_amount(&dispute.worker_share, "workerShare")?,
        votes,
    })
}

/// Decimal string to integer; an absent value counts as zero.
fn parse_decimal<T: FromStr + Default>(value: &str, field: &str) -> SourceResult<T> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(T::default());
    }
    value
        .parse()
        .map_err(|_| SourceError::Malformed(format!("{field}: invalid decimal {value:?}")))
}

fn parse_amount(value: &str, field: &str) -> SourceResult<u128> {
    parse_decimal(value, field)
}

fn parse_u64(value: &str, field: &str) -> SourceResult<u64> {
    parse_decimal(value, field)
}

fn parse_u32(value: &str, field: &str) -> SourceResult<u32> {
    parse_decimal(value, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SUMMARY: &str = r#"{
        "id": "0x00000000000000000000000000000000000000aa",
        "address": "0x00000000000000000000000000000000000000aa",
        "assignedTasks": [
            { "id": "t1", "taskId": "1", "title": "Logo", "reward": "1000", "status": "Paid" },
            { "id": "t2", "taskId": "2", "title": "Site", "reward": "2500", "status": "InProgress" }
        ],
        "biddingTaskAssigned": [
            { "id": "b3", "taskId": "3", "reward": "700", "status": "Completed" }
        ],
        "milestonePaymentTaskAssigned": [
            { "id": "m4", "taskId": "4", "reward": "900", "status": "InProgress",
              "completedMilestonesCount": "2", "milestonesCount": "4" }
        ],
        "createdTasks": [ { "id": "c5", "taskId": "5", "status": "Open", "reward": "10" } ],
        "workerDisputes": [
            { "id": "d1", "disputeId": "1", "taskId": "2", "rewardAmount": "1000",
              "workerShare": "300", "status": "Resolved",
              "votes": [ { "admin": { "stakeAmount": "50" }, "workerShare": "300" } ] },
            { "id": "d2", "disputeId": "2", "taskId": "1", "rewardAmount": "1000",
              "workerShare": "0", "status": "Filed", "votes": [] }
        ],
        "bids": [ { "id": "bid1", "taskId": "9", "amount": "42", "estimatedTime": "3600" } ]
    }"#;

    #[test]
    fn test_normalize_flattens_task_lists() {
        let summary: UserWorkSummary = serde_json::from_str(SUMMARY).unwrap();
        let snapshot = summary.normalize(Address::ZERO, 7).unwrap();

        assert_eq!(snapshot.total_assigned(), 4);
        assert_eq!(snapshot.completed_assigned(), 2);
        assert_eq!(snapshot.created_tasks.len(), 1);
        assert_eq!(snapshot.milestone_tasks.len(), 1);
        assert_eq!(snapshot.milestone_tasks[0].progress(0.5), 0.5);
        assert_eq!(snapshot.bids[0].estimated_time, 3_600);
        assert_eq!(snapshot.fetched_at, 7);
    }

    #[test]
    fn test_normalize_disputes() {
        let summary: UserWorkSummary = serde_json::from_str(SUMMARY).unwrap();
        let snapshot = summary.normalize(Address::ZERO, 0).unwrap();

        assert_eq!(snapshot.worker_disputes.len(), 2);
        assert_eq!(snapshot.settled_worker_disputes().count(), 1);

        let resolved = &snapshot.worker_disputes[0];
        assert_eq!(resolved.total_stake(), 50);
        assert!((resolved.awarded_worker_share() - 0.3).abs() < 1e-9);
        assert_eq!(snapshot.worker_disputes[1].status, DisputeStatus::Filed);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let summary: UserWorkSummary =
            serde_json::from_str(r#"{ "address": "0xabc" }"#).unwrap();
        assert!(summary.is_empty());

        let snapshot = summary.normalize(Address::ZERO, 0).unwrap();
        assert_eq!(snapshot, ActivitySnapshot::empty(Address::ZERO, 0));
    }

    #[test]
    fn test_malformed_amount_is_rejected() {
        let summary = UserWorkSummary {
            assigned_tasks: vec![TaskSummary {
                reward: "12abc".into(),
                status: "Paid".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_matches!(
            summary.normalize(Address::ZERO, 0),
            Err(SourceError::Malformed(msg)) if msg.contains("reward")
        );
    }
}
