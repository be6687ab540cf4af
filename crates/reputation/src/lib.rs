//! Reputation scoring engine.
//!
//! [`ReputationService`] ties the activity source, the score calculator, the
//! snapshot store, the score cache and the leaderboard together behind the
//! public operations:
//!
//! | Operation | Errors |
//! |---|---|
//! | [`get_user_score`](ReputationService::get_user_score) | InvalidAddress, NotFound, UpstreamUnavailable |
//! | [`calculate_score`](ReputationService::calculate_score) | InvalidAddress, NotFound, UpstreamUnavailable |
//! | [`get_score_history`](ReputationService::get_score_history) | InvalidAddress, NotFound |
//! | [`get_leaderboard`](ReputationService::get_leaderboard) | none |
//! | [`get_improvement_suggestions`](ReputationService::get_improvement_suggestions) | InvalidAddress, NotFound |
//! | [`get_anomaly_detection`](ReputationService::get_anomaly_detection) | InvalidAddress, NotFound |
//! | [`get_user_stats`](ReputationService::get_user_stats) | InvalidAddress, NotFound, UpstreamUnavailable |
//! | [`get_user_profile`](ReputationService::get_user_profile) | InvalidAddress, NotFound, UpstreamUnavailable |
//!
//! All recomputation for one address runs inside a single flight, which is
//! the only place snapshots are appended. Appends for an address are
//! therefore never concurrent.

mod config;
mod error;
mod metrics;
mod retry;
mod service;

pub use config::ServiceConfig;
pub use error::{ReputationError, ReputationResult};
pub use retry::RetryConfig;
pub use service::{ReputationService, ScoreOrigin, ScoreResult, UserProfile};
