//! Keyed single-flight execution.
//!
//! Concurrent callers for the same key share one underlying future. The
//! future runs only while at least one caller polls it: when every caller
//! drops its handle the computation is dropped with it, and the next caller
//! starts a fresh flight.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared, WeakShared},
};
use parking_lot::Mutex;

/// Handle to a shared flight.
pub type Flight<T> = Shared<BoxFuture<'static, T>>;

struct Entry<T> {
    id: u64,
    future: WeakShared<BoxFuture<'static, T>>,
}

type Registry<K, T> = Arc<Mutex<HashMap<K, Entry<T>>>>;

pub struct SingleFlight<K, T> {
    flights: Registry<K, T>,
    next_id: AtomicU64,
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<K, T> std::fmt::Debug for SingleFlight<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.flights.lock().len())
            .finish()
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `key`, or start one from `make`.
    ///
    /// `make` is only invoked when no live flight exists. The returned flag is
    /// `true` for the caller that started the flight.
    pub fn run<F, Fut>(&self, key: K, make: F) -> (Flight<T>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut flights = self.flights.lock();
        if let Some(shared) = flights.get(&key).and_then(|entry| entry.future.upgrade()) {
            return (shared, false);
        }

        // Entries whose callers all went away can no longer be joined.
        flights.retain(|_, entry| entry.future.upgrade().is_some());

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.flights);
        let flight_key = key.clone();
        let inner = make();
        let shared = async move {
            let output = inner.await;
            let mut flights = registry.lock();
            if flights.get(&flight_key).is_some_and(|entry| entry.id == id) {
                flights.remove(&flight_key);
            }
            output
        }
        .boxed()
        .shared();

        if let Some(future) = shared.downgrade() {
            flights.insert(key, Entry { id, future });
        }
        (shared, true)
    }

    /// Whether a live flight exists for `key`.
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights
            .lock()
            .get(key)
            .is_some_and(|entry| entry.future.upgrade().is_some())
    }

    /// Number of live flights.
    pub fn len(&self) -> usize {
        self.flights
            .lock()
            .values()
            .filter(|entry| entry.future.upgrade().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::atomic::AtomicUsize, time::Duration};

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let flights = Arc::new(SingleFlight::<u8, u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let flights = Arc::clone(&flights);
                let runs = Arc::clone(&runs);
                tokio::spawn(async move {
                    let (flight, _) = flights.run(1, || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        42
                    });
                    flight.await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(flights.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flights = SingleFlight::<u8, u8>::new();
        let (a, leader_a) = flights.run(1, || async { 1 });
        let (b, leader_b) = flights.run(2, || async { 2 });

        assert!(leader_a && leader_b);
        assert_eq!(flights.len(), 2);
        assert_eq!((a.await, b.await), (1, 2));
    }

    #[tokio::test]
    async fn test_completed_flight_is_not_joined() {
        let flights = SingleFlight::<u8, u8>::new();
        let (first, _) = flights.run(1, || async { 1 });
        assert_eq!(first.await, 1);

        let (second, leader) = flights.run(1, || async { 2 });
        assert!(leader);
        assert_eq!(second.await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_every_caller_cancels_the_flight() {
        let flights = SingleFlight::<u8, u8>::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let done = Arc::clone(&finished);
        let (flight, _) = flights.run(1, move || async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            done.fetch_add(1, Ordering::SeqCst);
            1
        });
        assert!(
            tokio::time::timeout(Duration::from_secs(1), flight)
                .await
                .is_err()
        );
        assert!(!flights.is_in_flight(&1));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        let (retry, leader) = flights.run(1, || async { 2 });
        assert!(leader);
        assert_eq!(retry.await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_caller_dropping_keeps_flight_alive() {
        let flights = SingleFlight::<u8, u8>::new();
        let (first, _) = flights.run(1, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            7
        });
        let (second, leader) = flights.run(1, || async { 0 });
        assert!(!leader);

        assert!(
            tokio::time::timeout(Duration::from_secs(1), first)
                .await
                .is_err()
        );
        assert!(flights.is_in_flight(&1));
        assert_eq!(second.await, 7);
    }
}
