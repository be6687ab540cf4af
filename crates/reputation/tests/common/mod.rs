#![allow(dead_code, unreachable_pub)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use nomad_primitives::{
    ActivitySnapshot, Address, BidRecord, DisputeRecord, DisputeStatus, DisputeVote,
    MilestoneTaskRecord, PendingSnapshot, ScoreSnapshot, TaskRecord, TaskStatus,
};
use nomad_reputation::{ReputationService, RetryConfig, ServiceConfig};
use nomad_source::MemoryActivitySource;
use nomad_storage::{MemorySnapshotStore, SnapshotStore, StoreError, StoreResult};

/// Memory store whose appends (and optionally reads) can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemorySnapshotStore,
    fail_appends: AtomicBool,
    fail_reads: AtomicBool,
    reads: AtomicU64,
}

impl FlakyStore {
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Read calls made so far, failed ones included.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_reads)
    }

    fn check(&self, flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected".into()));
        }
        Ok(())
    }
}

impl SnapshotStore for FlakyStore {
    fn append(&self, snapshot: &PendingSnapshot) -> StoreResult<u64> {
        self.check(&self.fail_appends)?;
        self.inner.append(snapshot)
    }

    fn history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ScoreSnapshot>> {
        self.read()?;
        self.inner.history(address, limit, offset)
    }

    fn latest(&self, address: &Address) -> StoreResult<Option<ScoreSnapshot>> {
        self.read()?;
        self.inner.latest(address)
    }

    fn latest_all(&self) -> StoreResult<Vec<ScoreSnapshot>> {
        self.read()?;
        self.inner.latest_all()
    }

    fn count(&self, address: &Address) -> StoreResult<u64> {
        self.read()?;
        self.inner.count(address)
    }
}

pub struct Harness {
    pub source: Arc<MemoryActivitySource>,
    pub store: Arc<FlakyStore>,
    pub service: ReputationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let source = Arc::new(MemoryActivitySource::new());
        let store = Arc::new(FlakyStore::default());
        let service = ReputationService::new(source.clone(), store.clone(), config).unwrap();
        Self {
            source,
            store,
            service,
        }
    }

    pub fn appends(&self, address: Address) -> u64 {
        self.store.inner.count(&address).unwrap()
    }
}

/// Fast retries so failure paths do not slow the suite down.
pub fn test_config() -> ServiceConfig {
    ServiceConfig::default().with_retry(RetryConfig {
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        ..Default::default()
    })
}

pub fn address(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn tasks(completed: usize, total: usize) -> Vec<TaskRecord> {
    (0..total)
        .map(|n| TaskRecord {
            task_id: n.to_string(),
            status: if n < completed {
                TaskStatus::Paid
            } else {
                TaskStatus::InProgress
            },
            reward: 1_000,
        })
        .collect()
}

pub fn bids(count: usize) -> Vec<BidRecord> {
    (0..count)
        .map(|n| BidRecord {
            bid_id: n.to_string(),
            task_id: n.to_string(),
            amount: 100,
            estimated_time: 86_400,
        })
        .collect()
}

/// No tasks, milestones, disputes or bids: total 300.
pub fn newcomer(address: Address) -> ActivitySnapshot {
    ActivitySnapshot::empty(address, 0)
}

/// 4 of 5 tasks done, one half-finished milestone task, 10 bids: total 520.
pub fn active_worker(address: Address) -> ActivitySnapshot {
    let mut activity = ActivitySnapshot::empty(address, 0);
    activity.assigned_tasks = tasks(4, 5);
    activity.milestone_tasks = vec![MilestoneTaskRecord {
        task_id: "m".into(),
        status: TaskStatus::InProgress,
        completed_milestones: 1,
        total_milestones: 2,
    }];
    activity.bids = bids(10);
    activity
}

/// Active worker who was awarded 30% of a fully staked dispute: total 400.
pub fn disputed_worker(address: Address) -> ActivitySnapshot {
    let mut activity = active_worker(address);
    activity.worker_disputes = vec![DisputeRecord {
        dispute_id: "1".into(),
        task_id: "1".into(),
        status: DisputeStatus::Resolved,
        reward_amount: 1_000,
        worker_share: 300,
        votes: vec![DisputeVote {
            admin_stake: 100,
            worker_share: 300,
        }],
    }];
    activity
}
