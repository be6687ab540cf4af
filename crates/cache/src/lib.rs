//! Cache-aside layer for computed scores.
//!
//! [`ScoreCache`] keeps one entry per address with a TTL and a grace window
//! past expiry, and funnels every recomputation for an address through a
//! [`SingleFlight`] so that concurrent misses share one computation.

mod backend;
mod score;
mod single_flight;

pub use backend::{CacheBackend, LruCacheBackend};
pub use score::{CacheConfig, CacheEntry, Lookup, Refreshed, ScoreCache};
pub use single_flight::{Flight, SingleFlight};

/// Errors from the cache backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
