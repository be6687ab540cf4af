//! Request orchestration.
//!
//! Per request: `Idle -> CacheHit -> Served` on the fast path, otherwise
//! `Idle -> FetchingSource -> Calculating -> Persisting -> Served` inside the
//! address's single flight. A fetch failure aborts before the store or cache
//! is touched. A persist failure still serves the computed score, uncached.

use std::{cmp::Ordering, sync::Arc};

use nomad_cache::{CacheBackend, Lookup, Refreshed, ScoreCache};
use nomad_leaderboard::LeaderboardRanker;
use nomad_primitives::{
    ActivitySnapshot, Address, AnomalyFlag, LeaderboardEntry, PendingSnapshot, ScoreSnapshot,
    UserScore, UserStats, parse_address, unix_timestamp_millis,
};
use nomad_score::{AnomalyDetector, ScoreCalculator, ScoreLevel, Suggestion, SuggestionEngine};
use nomad_source::{ActivitySource, SourceError};
use nomad_storage::{SnapshotStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    ReputationError, ReputationResult, ServiceConfig, metrics::ReputationMetrics, retry::retry,
};

/// Forced recomputations that joined a cache-validating flight start over at
/// most this many times.
const FORCE_ATTEMPTS: usize = 3;

/// Snapshots read per page when walking history back on rebuild.
const HISTORY_PAGE: usize = 64;

/// Where a served score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrigin {
    Cache,
    /// Expired entry served while a refresh was in flight.
    StaleCache,
    /// Read from the snapshot store while the cache was unavailable.
    Store,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(flatten)]
    pub score: UserScore,
    pub origin: ScoreOrigin,
    /// False when the score was computed but could not be recorded.
    pub persisted: bool,
}

impl ScoreResult {
    fn new(score: UserScore, origin: ScoreOrigin) -> Self {
        Self {
            score,
            origin,
            persisted: true,
        }
    }

    fn from_refreshed(refreshed: Refreshed) -> Self {
        match refreshed {
            Refreshed::Computed { score, persisted } => Self {
                score,
                origin: ScoreOrigin::Computed,
                persisted,
            },
            Refreshed::Cached(score) => Self::new(score, ScoreOrigin::Cache),
        }
    }
}

/// Score, tier, rank and activity counts of an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub score: ScoreResult,
    pub level: ScoreLevel,
    /// Absent until a score for the address has been persisted.
    pub rank: Option<u64>,
    pub stats: UserStats,
}

struct Inner {
    source: Arc<dyn ActivitySource>,
    store: Arc<dyn SnapshotStore>,
    cache: ScoreCache<ReputationError>,
    leaderboard: LeaderboardRanker,
    calculator: ScoreCalculator,
    anomaly: AnomalyDetector,
    suggestions: SuggestionEngine,
    config: ServiceConfig,
    metrics: ReputationMetrics,
}

/// The reputation scoring engine.
///
/// Cheap to clone; clones share caches, flights and the leaderboard.
#[derive(Clone)]
pub struct ReputationService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ReputationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationService")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache)
            .field("leaderboard", &self.inner.leaderboard.len())
            .finish_non_exhaustive()
    }
}

impl ReputationService {
    /// Service over an in-process LRU cache.
    ///
    /// The leaderboard is rebuilt from the latest persisted snapshots.
    pub fn new(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn SnapshotStore>,
        config: ServiceConfig,
    ) -> ReputationResult<Self> {
        let cache = ScoreCache::new(config.cache.clone());
        Self::with_cache(source, store, cache, config)
    }

    pub fn with_cache_backend(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn SnapshotStore>,
        backend: Arc<dyn CacheBackend>,
        config: ServiceConfig,
    ) -> ReputationResult<Self> {
        let cache = ScoreCache::with_backend(config.cache.clone(), backend);
        Self::with_cache(source, store, cache, config)
    }

    fn with_cache(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn SnapshotStore>,
        cache: ScoreCache<ReputationError>,
        config: ServiceConfig,
    ) -> ReputationResult<Self> {
        let inner = Inner {
            source,
            store,
            cache,
            leaderboard: LeaderboardRanker::new(),
            calculator: ScoreCalculator::new(config.weights.clone()),
            anomaly: AnomalyDetector::new(config.anomaly.clone()),
            suggestions: SuggestionEngine::new(config.suggestions.clone()),
            config,
            metrics: ReputationMetrics::default(),
        };
        let service = Self {
            inner: Arc::new(inner),
        };
        service.rebuild_leaderboard()?;
        Ok(service)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn leaderboard(&self) -> &LeaderboardRanker {
        &self.inner.leaderboard
    }

    /// Rebuild the leaderboard from the store, returning the entry count.
    ///
    /// Each address ranks by the time it first reached its current score.
    pub fn rebuild_leaderboard(&self) -> ReputationResult<usize> {
        let mut latest = self.inner.store.latest_all()?;
        for snapshot in &mut latest {
            snapshot.computed_at = self.inner.score_reached_at(snapshot)?;
        }
        let entries = latest.len();
        self.inner.leaderboard.rebuild(latest);
        Ok(entries)
    }

    /// Current score, preferring the cache.
    pub async fn get_user_score(&self, address: &str) -> ReputationResult<ScoreResult> {
        let address = parse_address(address)?;
        let inner = &self.inner;

        match inner.cache.lookup(&address) {
            Lookup::Fresh(entry) => {
                inner.metrics.inc_cache_hits();
                return Ok(ScoreResult::new(entry.score, ScoreOrigin::Cache));
            }
            Lookup::Stale(entry) if entry.refreshing => {
                inner.metrics.inc_stale_served();
                debug!(%address, "serving stale score while refresh is in flight");
                return Ok(ScoreResult::new(entry.score, ScoreOrigin::StaleCache));
            }
            Lookup::Stale(_) | Lookup::Miss => inner.metrics.inc_cache_misses(),
            Lookup::Unavailable(err) => {
                inner.metrics.inc_cache_degraded();
                warn!(%address, %err, "score cache unavailable, reading snapshot store");
                if let Some(snapshot) = inner.recent_snapshot(&address).await {
                    return Ok(ScoreResult::new(snapshot.into(), ScoreOrigin::Store));
                }
            }
        }

        let refreshed = self.refresh(address, false).await?;
        Ok(ScoreResult::from_refreshed(refreshed))
    }

    /// Recompute from a fresh activity fetch regardless of cache freshness.
    ///
    /// A flight already running for the address is joined rather than
    /// duplicated.
    pub async fn calculate_score(&self, address: &str) -> ReputationResult<ScoreResult> {
        let address = parse_address(address)?;

        let mut refreshed = self.refresh(address, true).await?;
        for _ in 1..FORCE_ATTEMPTS {
            if matches!(refreshed, Refreshed::Computed { .. }) {
                break;
            }
            debug!(%address, "joined flight served cache, recomputing");
            refreshed = self.refresh(address, true).await?;
        }
        Ok(ScoreResult::from_refreshed(refreshed))
    }

    /// Persisted snapshots, newest first.
    pub async fn get_score_history(
        &self,
        address: &str,
        limit: usize,
        offset: usize,
    ) -> ReputationResult<Vec<ScoreSnapshot>> {
        let address = parse_address(address)?;
        let inner = &self.inner;

        let count = inner
            .read_store("count", |store| store.count(&address))
            .await?;
        if count == 0 {
            return Err(ReputationError::NotFound(address));
        }
        inner
            .read_store("history", |store| store.history(&address, limit, offset))
            .await
    }

    pub fn get_leaderboard(&self, limit: usize, offset: usize) -> Vec<LeaderboardEntry> {
        self.inner.leaderboard.page(limit, offset)
    }

    /// Suggestions for the components with the most headroom in the current
    /// score.
    pub async fn get_improvement_suggestions(
        &self,
        address: &str,
    ) -> ReputationResult<Vec<Suggestion>> {
        let current = self.get_user_score(address).await?;
        Ok(self.inner.suggestions.suggest(&current.score.breakdown))
    }

    /// Flag the latest score delta if it is abnormal.
    pub async fn get_anomaly_detection(
        &self,
        address: &str,
    ) -> ReputationResult<Option<AnomalyFlag>> {
        let address = parse_address(address)?;
        let inner = &self.inner;
        let window = inner.config.anomaly.window.max(2);

        let history = inner
            .read_store("history", |store| store.history(&address, window, 0))
            .await?;
        if history.is_empty() {
            return Err(ReputationError::NotFound(address));
        }

        let flag = inner.anomaly.detect(&history);
        if let Some(flag) = &flag {
            inner.metrics.inc_anomalies_flagged();
            info!(
                %address,
                from = flag.from_snapshot,
                to = flag.to_snapshot,
                delta = flag.delta,
                threshold = flag.threshold_used,
                "score anomaly flagged"
            );
        }
        Ok(flag)
    }

    /// Raw activity counts, fetched fresh. Never touches store or cache.
    pub async fn get_user_stats(&self, address: &str) -> ReputationResult<UserStats> {
        let address = parse_address(address)?;
        Ok(self.inner.fetch(address).await?.stats())
    }

    /// Cache-first score with its tier, leaderboard rank and fresh activity
    /// counts.
    pub async fn get_user_profile(&self, address: &str) -> ReputationResult<UserProfile> {
        let score = self.get_user_score(address).await?;
        let address = score.score.address;
        let stats = self.inner.fetch(address).await?.stats();

        Ok(UserProfile {
            level: self.inner.config.levels.level(score.score.score),
            rank: self.inner.leaderboard.rank_of(&address),
            stats,
            score,
        })
    }

    async fn refresh(&self, address: Address, force: bool) -> ReputationResult<Refreshed> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .cache
            .refresh(address, move || inner.compute(address, force))
            .await
    }
}

impl Inner {
    /// Body of a refresh flight.
    ///
    /// Every await happens before the append, so dropping the flight never
    /// leaves a partial write behind.
    async fn compute(self: Arc<Self>, address: Address, force: bool) -> ReputationResult<Refreshed> {
        // A flight that finished between our lookup and this one may have
        // refreshed the entry already.
        if !force && let Lookup::Fresh(entry) = self.cache.lookup(&address) {
            return Ok(Refreshed::Cached(entry.score));
        }

        let activity = self.fetch(address).await?;

        let breakdown = self.calculator.calculate(&activity);
        let weights = self.calculator.weights();
        if let Err(violation) = breakdown.validate(weights.total_min, weights.total_max) {
            error!(%address, %violation, "score breakdown violates its invariants");
            return Err(violation.into());
        }

        let pending = PendingSnapshot::new(address, breakdown, unix_timestamp_millis());
        let score = UserScore::from(&pending);

        match self.store.append(&pending) {
            Ok(sequence) => {
                self.metrics.inc_snapshot_appends();
                let snapshot = pending.with_sequence(sequence);
                self.leaderboard.upsert(&snapshot);
                info!(%address, sequence, score = snapshot.score, "recorded score snapshot");
                Ok(Refreshed::Computed {
                    score,
                    persisted: true,
                })
            }
            Err(err) => {
                self.metrics.inc_persist_failures();
                warn!(%address, %err, "failed to persist score snapshot, serving it uncached");
                Ok(Refreshed::Computed {
                    score,
                    persisted: false,
                })
            }
        }
    }

    /// Fetch activity with a per-call deadline, retrying transport failures.
    async fn fetch(&self, address: Address) -> ReputationResult<ActivitySnapshot> {
        let timeout = self.config.fetch_timeout();

        let result = retry(
            &self.config.retry,
            "fetch_snapshot",
            SourceError::is_transient,
            move || async move {
                self.metrics.inc_upstream_fetches();
                match tokio::time::timeout(timeout, self.source.fetch_snapshot(address)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Transport(format!(
                        "no response within {}s",
                        timeout.as_secs()
                    ))),
                }
            },
        )
        .await;

        result.map_err(|err| {
            if !matches!(err, SourceError::NotFound(_)) {
                self.metrics.inc_upstream_failures();
                warn!(%address, %err, "activity fetch failed");
            }
            err.into()
        })
    }

    async fn read_store<T>(
        &self,
        name: &'static str,
        read: impl Fn(&dyn SnapshotStore) -> StoreResult<T> + Send,
    ) -> ReputationResult<T> {
        retry(&self.config.retry, name, StoreError::is_transient, || {
            std::future::ready(read(self.store.as_ref()))
        })
        .await
        .map_err(|err| {
            warn!(op = name, %err, "snapshot store read failed");
            err.into()
        })
    }

    /// `computed_at` of the oldest snapshot in the unbroken run of `latest`'s
    /// score at the head of its history.
    fn score_reached_at(&self, latest: &ScoreSnapshot) -> StoreResult<u64> {
        let mut reached = latest.computed_at;
        let mut offset = 0;
        loop {
            let page = self.store.history(&latest.address, HISTORY_PAGE, offset)?;
            for snapshot in &page {
                if snapshot.score.total_cmp(&latest.score) != Ordering::Equal {
                    return Ok(reached);
                }
                reached = snapshot.computed_at;
            }
            if page.len() < HISTORY_PAGE {
                return Ok(reached);
            }
            offset += page.len();
        }
    }

    /// Latest persisted snapshot, if younger than the cache TTL.
    async fn recent_snapshot(&self, address: &Address) -> Option<ScoreSnapshot> {
        let ttl_ms = self.config.cache.ttl().as_millis() as u64;
        match self.read_store("latest", |store| store.latest(address)).await {
            Ok(Some(snapshot))
                if unix_timestamp_millis().saturating_sub(snapshot.computed_at) <= ttl_ms =>
            {
                Some(snapshot)
            }
            Ok(_) | Err(_) => None,
        }
    }
}
