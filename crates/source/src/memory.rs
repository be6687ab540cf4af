use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use nomad_primitives::{ActivitySnapshot, Address, unix_timestamp_millis};
use parking_lot::RwLock;
use tracing::trace;

use crate::{ActivitySource, SourceError, SourceResult};

/// In-memory activity source.
///
/// Counts fetches and can inject latency or transport failures, which makes
/// it the harness for concurrency and degradation tests.
#[derive(Debug, Default)]
pub struct MemoryActivitySource {
    activity: RwLock<HashMap<Address, ActivitySnapshot>>,
    fetches: AtomicU64,
    fail_next: AtomicU32,
    delay: RwLock<Option<Duration>>,
}

impl MemoryActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the activity of `snapshot.address`.
    pub fn insert(&self, snapshot: ActivitySnapshot) {
        self.activity.write().insert(snapshot.address, snapshot);
    }

    pub fn remove(&self, address: &Address) -> Option<ActivitySnapshot> {
        self.activity.write().remove(address)
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Delay every subsequent fetch by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    /// Fail the next `count` fetches with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ActivitySource for MemoryActivitySource {
    async fn fetch_snapshot(&self, address: Address) -> SourceResult<ActivitySnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        trace!(%address, "memory source fetch");

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_failure() {
            return Err(SourceError::Transport("injected failure".into()));
        }

        let mut snapshot = self
            .activity
            .read()
            .get(&address)
            .cloned()
            .ok_or(SourceError::NotFound(address))?;
        snapshot.fetched_at = unix_timestamp_millis();
        Ok(snapshot)
    }
}
