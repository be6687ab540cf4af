//! Cache backing stores.

use std::sync::atomic::{AtomicBool, Ordering};

use auto_impl::auto_impl;
use hashlink::LruCache;
use nomad_primitives::Address;
use parking_lot::Mutex;

use crate::{CacheEntry, CacheError};

/// Backing store of the score cache namespace, keyed by address.
#[auto_impl(&, Box, Arc)]
pub trait CacheBackend: Send + Sync {
    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, CacheError>;

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError>;
}

/// In-process LRU backend.
///
/// Uses Mutex because `LruCache::get` mutates internal ordering.
#[derive(Debug)]
pub struct LruCacheBackend {
    entries: Mutex<LruCache<Address, CacheEntry>>,
    offline: AtomicBool,
}

impl LruCacheBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity.max(1))),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every operation fail with [`CacheError::Unavailable`] until
    /// switched back on.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("backend offline".into()));
        }
        Ok(())
    }
}

impl CacheBackend for LruCacheBackend {
    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, CacheError> {
        self.check_online()?;
        Ok(self.entries.lock().get(address).cloned())
    }

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.check_online()?;
        // Evicts the least recently used entry when at capacity.
        self.entries.lock().insert(entry.address, entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use nomad_primitives::{ScoreBreakdown, UserScore};
    use std::collections::BTreeMap;
    use tokio::time::Instant;

    fn entry(byte: u8) -> CacheEntry {
        let address = Address::repeat_byte(byte);
        CacheEntry {
            address,
            score: UserScore {
                address,
                score: byte as f64,
                breakdown: ScoreBreakdown {
                    components: BTreeMap::new(),
                    total: byte as f64,
                },
                computed_at: 0,
            },
            expires_at: Instant::now(),
            refreshing: false,
        }
    }

    #[test]
    fn test_lru_eviction() {
        let backend = LruCacheBackend::new(2);
        backend.put(entry(1)).unwrap();
        backend.put(entry(2)).unwrap();

        // Touch 1 so that 2 becomes least recently used.
        assert!(backend.get(&Address::repeat_byte(1)).unwrap().is_some());
        backend.put(entry(3)).unwrap();

        assert_eq!(backend.len(), 2);
        assert!(backend.get(&Address::repeat_byte(2)).unwrap().is_none());
        assert!(backend.get(&Address::repeat_byte(1)).unwrap().is_some());
    }

    #[test]
    fn test_offline_backend_fails() {
        let backend = LruCacheBackend::new(4);
        backend.set_offline(true);

        assert_matches!(backend.put(entry(1)), Err(CacheError::Unavailable(_)));
        assert_matches!(
            backend.get(&Address::repeat_byte(1)),
            Err(CacheError::Unavailable(_))
        );

        backend.set_offline(false);
        assert!(backend.put(entry(1)).is_ok());
    }
}
