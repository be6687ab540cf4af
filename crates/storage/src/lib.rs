//! Append-only store of score snapshots.
//!
//! Snapshots are keyed by `(address, sequence)`. Sequences start at 1 and
//! increase by one per append for the same address; nothing is ever updated
//! or deleted. Backends:
//!
//! - [`MemorySnapshotStore`] - in-process arena, lost on restart
//! - `nomad-storage-redb` - durable, on redb

mod memory;

pub use memory::MemorySnapshotStore;

use auto_impl::auto_impl;
use nomad_primitives::{Address, PendingSnapshot, ScoreSnapshot};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The address exhausted its sequence space.
    #[error("sequence overflow for {0}")]
    SequenceOverflow(Address),
}

impl StoreError {
    /// Whether an idempotent read may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Unavailable(_))
    }
}

/// Snapshot persistence with auto-impl for &, Box, Arc.
#[auto_impl(&, Box, Arc)]
pub trait SnapshotStore: Send + Sync {
    /// Persist `snapshot`, returning the sequence it was assigned.
    ///
    /// Appends for one address are linearizable: no two calls receive the
    /// same sequence.
    fn append(&self, snapshot: &PendingSnapshot) -> StoreResult<u64>;

    /// Up to `limit` snapshots after skipping `offset`, newest first.
    ///
    /// Order is by descending sequence. This matches descending
    /// `computed_at` unless the wall clock stepped back between appends, in
    /// which case sequence still wins.
    fn history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ScoreSnapshot>>;

    /// The snapshot with the highest sequence, if any.
    fn latest(&self, address: &Address) -> StoreResult<Option<ScoreSnapshot>>;

    /// The latest snapshot of every address.
    fn latest_all(&self) -> StoreResult<Vec<ScoreSnapshot>>;

    /// Number of snapshots recorded for `address`.
    fn count(&self, address: &Address) -> StoreResult<u64>;
}
