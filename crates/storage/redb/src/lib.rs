//! redb-based snapshot storage backend.
//!
//! This crate provides [`RedbSnapshotStore`], a durable [`SnapshotStore`]
//! backed by the redb embedded database.

mod error;

pub use error::RedbStoreError;

use std::{collections::BTreeMap, path::Path};

use nomad_primitives::{Address, PendingSnapshot, ScoreSnapshot};
use nomad_storage::{SnapshotStore, StoreResult};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use tracing::{debug, trace};

const ADDRESS_LEN: usize = 20;
const KEY_LEN: usize = ADDRESS_LEN + 8;

/// Table definition for snapshots.
/// Key: 20-byte address followed by the big-endian u64 sequence
/// Value: postcard-encoded [`ScoreSnapshot`]
const SNAPSHOTS_TABLE: TableDefinition<&[u8; KEY_LEN], &[u8]> =
    TableDefinition::new("score_snapshots");

type Result<T> = std::result::Result<T, RedbStoreError>;

/// Composite key; big-endian sequences keep one address's range scan ordered.
fn snapshot_key(address: &Address, sequence: u64) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let (addr, seq) = key.split_at_mut(ADDRESS_LEN);
    addr.copy_from_slice(address.as_slice());
    seq.copy_from_slice(&sequence.to_be_bytes());
    key
}

/// Key bounds covering every sequence of `address`.
fn address_range(address: &Address) -> ([u8; KEY_LEN], [u8; KEY_LEN]) {
    (snapshot_key(address, 0), snapshot_key(address, u64::MAX))
}

fn key_address(key: &[u8; KEY_LEN]) -> Address {
    Address::from_slice(key.get(..ADDRESS_LEN).unwrap_or(&[0u8; ADDRESS_LEN]))
}

fn key_sequence(key: &[u8; KEY_LEN]) -> u64 {
    let mut seq = [0u8; 8];
    if let Some(bytes) = key.get(ADDRESS_LEN..) {
        seq.copy_from_slice(bytes);
    }
    u64::from_be_bytes(seq)
}

fn decode(bytes: &[u8]) -> Result<ScoreSnapshot> {
    Ok(postcard::from_bytes(bytes)?)
}

/// redb-based snapshot store.
///
/// Every append runs in its own write transaction; redb serializes write
/// transactions, so sequence assignment is linearizable per address.
pub struct RedbSnapshotStore {
    db: Database,
}

impl std::fmt::Debug for RedbSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSnapshotStore").finish_non_exhaustive()
    }
}

impl RedbSnapshotStore {
    /// Open or create a snapshot store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::create(path.as_ref())?;

        // Ensure the snapshots table exists
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
        }
        write_txn.commit()?;

        debug!(path = %path.as_ref().display(), "opened redb snapshot store");
        Ok(Self { db })
    }

    /// Total number of snapshots across all addresses.
    pub fn len(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn append_snapshot(&self, snapshot: &PendingSnapshot) -> Result<u64> {
        let address = snapshot.address;
        let write_txn = self.db.begin_write()?;
        let sequence = {
            let mut table = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let (start, end) = address_range(&address);
            let last = match table.range::<&[u8; KEY_LEN]>(&start..=&end)?.next_back() {
                Some(entry) => Some(key_sequence(entry?.0.value())),
                None => None,
            };
            let sequence = match last {
                Some(last) => last
                    .checked_add(1)
                    .ok_or(RedbStoreError::SequenceOverflow(address))?,
                None => 1,
            };

            let stored = snapshot.clone().with_sequence(sequence);
            let value = postcard::to_allocvec(&stored)?;
            table.insert(&snapshot_key(&address, sequence), value.as_slice())?;
            sequence
        };
        write_txn.commit()?;

        trace!(%address, sequence, "appended snapshot");
        Ok(sequence)
    }

    fn read_history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ScoreSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let (start, end) = address_range(address);

        let mut snapshots = Vec::new();
        for entry in table.range::<&[u8; KEY_LEN]>(&start..=&end)?.rev().skip(offset).take(limit) {
            let (_, value) = entry?;
            snapshots.push(decode(value.value())?);
        }
        Ok(snapshots)
    }

    fn read_latest(&self, address: &Address) -> Result<Option<ScoreSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let (start, end) = address_range(address);
        match table.range::<&[u8; KEY_LEN]>(&start..=&end)?.next_back() {
            Some(entry) => Ok(Some(decode(entry?.1.value())?)),
            None => Ok(None),
        }
    }

    fn read_latest_all(&self) -> Result<Vec<ScoreSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        // Keys ascend by (address, sequence): the last entry per address wins.
        let mut latest: BTreeMap<Address, Vec<u8>> = BTreeMap::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            latest.insert(key_address(key.value()), value.value().to_vec());
        }

        latest.values().map(|bytes| decode(bytes)).collect()
    }

    fn read_count(&self, address: &Address) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let (start, end) = address_range(address);
        let mut count = 0u64;
        for entry in table.range::<&[u8; KEY_LEN]>(&start..=&end)? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn append(&self, snapshot: &PendingSnapshot) -> StoreResult<u64> {
        Ok(self.append_snapshot(snapshot)?)
    }

    fn history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ScoreSnapshot>> {
        Ok(self.read_history(address, limit, offset)?)
    }

    fn latest(&self, address: &Address) -> StoreResult<Option<ScoreSnapshot>> {
        Ok(self.read_latest(address)?)
    }

    fn latest_all(&self) -> StoreResult<Vec<ScoreSnapshot>> {
        Ok(self.read_latest_all()?)
    }

    fn count(&self, address: &Address) -> StoreResult<u64> {
        Ok(self.read_count(address)?)
    }
}
