use std::{future::Future, sync::Arc, time::Duration};

use nomad_primitives::{Address, UserScore};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{CacheBackend, CacheError, Flight, LruCacheBackend, SingleFlight};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached score (default: 300).
    pub ttl_secs: u64,
    /// Window past expiry in which a stale score may still be served while a
    /// refresh is running (default: 60).
    pub grace_secs: u64,
    /// Maximum number of cached addresses (default: 10000).
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            grace_secs: 60,
            capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

/// A cached score.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub address: Address,
    pub score: UserScore,
    pub expires_at: Instant,
    /// Whether a recomputation for the address is in flight. Set on lookup.
    pub refreshing: bool,
}

/// Outcome of a cache lookup. A miss is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(CacheEntry),
    /// Expired, but within the grace window.
    Stale(CacheEntry),
    Miss,
    /// The backing store failed; callers degrade to the snapshot store.
    Unavailable(CacheError),
}

/// Result of a refresh flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Refreshed {
    /// A new score was computed; `persisted` is false when the append failed.
    Computed { score: UserScore, persisted: bool },
    /// The flight found a fresh entry written by an earlier flight.
    Cached(UserScore),
}

impl Refreshed {
    pub fn score(&self) -> &UserScore {
        match self {
            Self::Computed { score, .. } | Self::Cached(score) => score,
        }
    }

    pub fn into_score(self) -> UserScore {
        match self {
            Self::Computed { score, .. } | Self::Cached(score) => score,
        }
    }
}

/// Score cache with single-flight refresh.
///
/// Entries are only ever written by a refresh whose score was persisted, so
/// the cache never holds a value missing from the snapshot store.
pub struct ScoreCache<E> {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    flights: SingleFlight<Address, Result<Refreshed, E>>,
}

impl<E> std::fmt::Debug for ScoreCache<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCache")
            .field("config", &self.config)
            .field("flights", &self.flights)
            .finish_non_exhaustive()
    }
}

impl<E> ScoreCache<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Cache over an in-process LRU backend.
    pub fn new(config: CacheConfig) -> Self {
        let backend = Arc::new(LruCacheBackend::new(config.capacity));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            flights: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn lookup(&self, address: &Address) -> Lookup {
        let entry = match self.backend.get(address) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Lookup::Miss,
            Err(err) => return Lookup::Unavailable(err),
        };

        let now = Instant::now();
        let entry = CacheEntry {
            refreshing: self.flights.is_in_flight(address),
            ..entry
        };

        if now < entry.expires_at {
            Lookup::Fresh(entry)
        } else if now < entry.expires_at + self.config.grace() {
            Lookup::Stale(entry)
        } else {
            Lookup::Miss
        }
    }

    pub fn is_refreshing(&self, address: &Address) -> bool {
        self.flights.is_in_flight(address)
    }

    /// Join or start the refresh flight for `address`.
    ///
    /// `make` runs only when no flight is live. A computed and persisted
    /// score is written to the cache once, inside the flight, before any
    /// waiter observes the result.
    pub fn refresh<F, Fut>(&self, address: Address, make: F) -> Flight<Result<Refreshed, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Refreshed, E>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let ttl = self.config.ttl();

        let (flight, leader) = self.flights.run(address, move || {
            let compute = make();
            async move {
                let result = compute.await;
                if let Ok(Refreshed::Computed {
                    score,
                    persisted: true,
                }) = &result
                {
                    let entry = CacheEntry {
                        address,
                        score: score.clone(),
                        expires_at: Instant::now() + ttl,
                        refreshing: false,
                    };
                    if let Err(err) = backend.put(entry) {
                        warn!(%address, %err, "failed to write cache entry");
                    }
                }
                result
            }
        });

        if !leader {
            debug!(%address, "joined in-flight refresh");
        }
        flight
    }
}
