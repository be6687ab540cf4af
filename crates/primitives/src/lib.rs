//! Core primitive types for the Nomad reputation engine.
//!
//! This crate provides the shared vocabulary of every other crate in the
//! workspace. It intentionally has no I/O and no async.
//!
//! # Types
//!
//! ## Addresses
//! - [`Address`] - 20-byte participant address (re-exported from alloy)
//! - [`parse_address`] - Strict `0x`-prefixed hex parsing
//!
//! ## Activity
//! - [`ActivitySnapshot`] - Normalized, immutable per-address activity aggregate
//! - [`TaskRecord`], [`MilestoneTaskRecord`], [`DisputeRecord`], [`BidRecord`]
//!
//! ## Scores
//! - [`ScoreBreakdown`] - Weighted component decomposition of a score
//! - [`ScoreSnapshot`] - Persisted, sequenced score record
//! - [`UserScore`] - The current score of a participant
//! - [`LeaderboardEntry`], [`AnomalyFlag`]

mod activity;
mod address;
mod breakdown;
mod snapshot;
mod time;

pub use activity::{
    ActivitySnapshot, BidRecord, DisputeRecord, DisputeStatus, DisputeVote, MilestoneTaskRecord,
    TaskRecord, TaskStatus, UserStats,
};
pub use address::{Address, InvalidAddress, parse_address};
pub use breakdown::{BreakdownViolation, ComponentId, ComponentScore, ScoreBreakdown};
pub use snapshot::{AnomalyFlag, LeaderboardEntry, PendingSnapshot, ScoreSnapshot, UserScore};
pub use time::unix_timestamp_millis;
