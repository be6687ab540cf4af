//! Reputation scoring.
//!
//! Everything in this crate is pure: no I/O, no clocks, no shared state.
//!
//! - [`ScoreCalculator`] turns an [`ActivitySnapshot`] into a
//!   [`ScoreBreakdown`] using tunable [`ScoreWeights`].
//! - [`SuggestionEngine`] ranks components by headroom and maps them to
//!   improvement suggestions.
//! - [`AnomalyDetector`] flags abnormal deltas across score history.
//! - [`LevelThresholds`] maps a score to a [`ScoreLevel`] tier.
//!
//! [`ActivitySnapshot`]: nomad_primitives::ActivitySnapshot
//! [`ScoreBreakdown`]: nomad_primitives::ScoreBreakdown

mod anomaly;
mod calculator;
mod level;
mod suggest;
mod weights;

pub use anomaly::{AnomalyConfig, AnomalyDetector};
pub use calculator::ScoreCalculator;
pub use level::{LevelThresholds, ScoreLevel};
pub use suggest::{Suggestion, SuggestionConfig, SuggestionEngine};
pub use weights::ScoreWeights;
