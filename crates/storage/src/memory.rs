//! In-memory snapshot store (does not persist across restarts).

use std::collections::HashMap;

use nomad_primitives::{Address, PendingSnapshot, ScoreSnapshot};
use parking_lot::RwLock;
use tracing::trace;

use crate::{SnapshotStore, StoreError, StoreResult};

/// Per-address arenas of snapshots, ascending by sequence.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    arenas: RwLock<HashMap<Address, Vec<ScoreSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn append(&self, snapshot: &PendingSnapshot) -> StoreResult<u64> {
        let mut arenas = self.arenas.write();
        let arena = arenas.entry(snapshot.address).or_default();

        let sequence = match arena.last() {
            Some(last) => last
                .sequence
                .checked_add(1)
                .ok_or(StoreError::SequenceOverflow(snapshot.address))?,
            None => 1,
        };
        arena.push(snapshot.clone().with_sequence(sequence));

        trace!(address = %snapshot.address, sequence, "appended snapshot");
        Ok(sequence)
    }

    fn history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ScoreSnapshot>> {
        Ok(self
            .arenas
            .read()
            .get(address)
            .map(|arena| arena.iter().rev().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn latest(&self, address: &Address) -> StoreResult<Option<ScoreSnapshot>> {
        Ok(self
            .arenas
            .read()
            .get(address)
            .and_then(|arena| arena.last())
            .cloned())
    }

    fn latest_all(&self) -> StoreResult<Vec<ScoreSnapshot>> {
        Ok(self
            .arenas
            .read()
            .values()
            .filter_map(|arena| arena.last())
            .cloned()
            .collect())
    }

    fn count(&self, address: &Address) -> StoreResult<u64> {
        Ok(self
            .arenas
            .read()
            .get(address)
            .map_or(0, |arena| arena.len() as u64))
    }
}
