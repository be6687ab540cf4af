//! Upstream activity source.
//!
//! The indexer is a black box reached through [`ActivitySource`]. Its
//! heterogeneous payload ([`UserWorkSummary`]) is normalized into the fixed
//! [`ActivitySnapshot`] shape here, so nothing downstream branches on
//! upstream field presence.
//!
//! Implementations:
//! - [`MemoryActivitySource`] - in-process map, with fetch counting and
//!   fault injection for tests
//! - [`FileActivitySource`] - JSON fixture of indexer records

mod error;
mod file;
mod memory;
mod subgraph;

pub use error::{SourceError, SourceResult};
pub use file::FileActivitySource;
pub use memory::MemoryActivitySource;
pub use subgraph::{
    AdminRecord, AdminVoteRecord, BidSummary, DisputeSummary, MilestoneTaskSummary, TaskSimple,
    TaskSummary, UserWorkSummary,
};

use async_trait::async_trait;
use nomad_primitives::{ActivitySnapshot, Address};

/// Read interface to the indexer.
#[async_trait]
pub trait ActivitySource: Send + Sync + 'static {
    /// Fetch a fresh activity snapshot for `address`.
    ///
    /// Fails with [`SourceError::NotFound`] when the address has no recorded
    /// activity and [`SourceError::Transport`] when the indexer is unreachable.
    async fn fetch_snapshot(&self, address: Address) -> SourceResult<ActivitySnapshot>;
}
