//! Leaderboard over the latest persisted score of every address.
//!
//! The ranker keeps an ordered index that is updated on every successful
//! append. Ordering: score descending, then earliest `computed_at`, then
//! address bytes ascending. The index is derived state; [`LeaderboardRanker::rebuild`]
//! recreates it from the snapshot store and swaps it in atomically.
//!
//! Staleness: none relative to appends made through the same process. Each
//! upsert happens right after the append it reflects, under a lock scoped to
//! the index only.

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use nomad_primitives::{Address, LeaderboardEntry, ScoreSnapshot, unix_timestamp_millis};
use parking_lot::RwLock;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct RankKey {
    score: f64,
    computed_at: u64,
    address: Address,
}

impl RankKey {
    fn new(snapshot: &ScoreSnapshot) -> Self {
        Self {
            score: snapshot.score,
            computed_at: snapshot.computed_at,
            address: snapshot.address,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.computed_at.cmp(&other.computed_at))
            .then_with(|| self.address.cmp(&other.address))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

#[derive(Debug, Default)]
struct RankIndex {
    ordered: BTreeSet<RankKey>,
    /// Current key and sequence per address.
    by_address: HashMap<Address, (RankKey, u64)>,
    /// Unix millis of the last rebuild.
    rebuilt_at: u64,
}

impl RankIndex {
    /// Returns whether the index changed.
    ///
    /// A recomputation that leaves the score unchanged keeps the time the
    /// address first reached it.
    fn upsert(&mut self, snapshot: &ScoreSnapshot) -> bool {
        let mut key = RankKey::new(snapshot);
        if let Some((current, sequence)) = self.by_address.get(&snapshot.address) {
            if *sequence >= snapshot.sequence {
                return false;
            }
            if current.score.total_cmp(&key.score) == Ordering::Equal {
                key.computed_at = current.computed_at;
            }
            self.ordered.remove(current);
        }

        self.ordered.insert(key);
        self.by_address
            .insert(snapshot.address, (key, snapshot.sequence));
        true
    }
}

/// Ordered index of the latest score per address.
#[derive(Debug, Default)]
pub struct LeaderboardRanker {
    index: RwLock<RankIndex>,
}

impl LeaderboardRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `snapshot` as the latest score of its address.
    ///
    /// Snapshots older than the one already indexed are ignored.
    pub fn upsert(&self, snapshot: &ScoreSnapshot) -> bool {
        let changed = self.index.write().upsert(snapshot);
        trace!(
            address = %snapshot.address,
            sequence = snapshot.sequence,
            changed,
            "leaderboard upsert"
        );
        changed
    }

    /// Replace the whole index with one built from `snapshots`.
    ///
    /// Snapshots of one address are applied in sequence order, so passing a
    /// latest snapshot whose `computed_at` is the time its score was first
    /// reached ranks it the same as the incremental path would. The new index
    /// is built without holding the lock; readers see either
    /// the old or the new index, never a partial one.
    pub fn rebuild(&self, snapshots: impl IntoIterator<Item = ScoreSnapshot>) {
        let mut index = RankIndex::default();
        for snapshot in snapshots {
            index.upsert(&snapshot);
        }
        index.rebuilt_at = unix_timestamp_millis();
        let entries = index.ordered.len();

        *self.index.write() = index;
        debug!(entries, "rebuilt leaderboard");
    }

    /// Entries ranked `offset + 1 ..= offset + limit`.
    pub fn page(&self, limit: usize, offset: usize) -> Vec<LeaderboardEntry> {
        self.index
            .read()
            .ordered
            .iter()
            .skip(offset)
            .take(limit)
            .enumerate()
            .map(|(i, key)| LeaderboardEntry {
                address: key.address,
                score: key.score,
                rank: (offset + i + 1) as u64,
                computed_at: key.computed_at,
            })
            .collect()
    }

    /// 1-based rank of `address`, if indexed.
    pub fn rank_of(&self, address: &Address) -> Option<u64> {
        let index = self.index.read();
        let (key, _) = index.by_address.get(address)?;
        index
            .ordered
            .iter()
            .position(|k| k == key)
            .map(|pos| pos as u64 + 1)
    }

    pub fn len(&self) -> usize {
        self.index.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unix millis of the last full rebuild, 0 if never rebuilt.
    pub fn rebuilt_at(&self) -> u64 {
        self.index.read().rebuilt_at
    }
}
