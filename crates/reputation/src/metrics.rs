//! Reputation service metrics

use metrics::Counter;

#[derive(Clone, Debug)]
pub(crate) struct ReputationMetrics {
    /// Scores served from a fresh cache entry
    cache_hits_total: Counter,
    /// Lookups that found no usable entry
    cache_misses_total: Counter,
    /// Stale entries served while a refresh was in flight
    cache_stale_served_total: Counter,
    /// Lookups that fell back to the snapshot store
    cache_degraded_total: Counter,
    /// Activity source calls, retries included
    upstream_fetches_total: Counter,
    /// Fetches that failed after retries
    upstream_failures_total: Counter,
    snapshot_appends_total: Counter,
    persist_failures_total: Counter,
    anomalies_flagged_total: Counter,
}

impl Default for ReputationMetrics {
    fn default() -> Self {
        Self {
            cache_hits_total: metrics::counter!("reputation.cache.hits_total"),
            cache_misses_total: metrics::counter!("reputation.cache.misses_total"),
            cache_stale_served_total: metrics::counter!("reputation.cache.stale_served_total"),
            cache_degraded_total: metrics::counter!("reputation.cache.degraded_total"),
            upstream_fetches_total: metrics::counter!("reputation.upstream.fetches_total"),
            upstream_failures_total: metrics::counter!("reputation.upstream.failures_total"),
            snapshot_appends_total: metrics::counter!("reputation.store.appends_total"),
            persist_failures_total: metrics::counter!("reputation.store.persist_failures_total"),
            anomalies_flagged_total: metrics::counter!("reputation.anomalies.flagged_total"),
        }
    }
}

impl ReputationMetrics {
    pub(crate) fn inc_cache_hits(&self) {
        self.cache_hits_total.increment(1);
    }

    pub(crate) fn inc_cache_misses(&self) {
        self.cache_misses_total.increment(1);
    }

    pub(crate) fn inc_stale_served(&self) {
        self.cache_stale_served_total.increment(1);
    }

    pub(crate) fn inc_cache_degraded(&self) {
        self.cache_degraded_total.increment(1);
    }

    pub(crate) fn inc_upstream_fetches(&self) {
        self.upstream_fetches_total.increment(1);
    }

    pub(crate) fn inc_upstream_failures(&self) {
        self.upstream_failures_total.increment(1);
    }

    pub(crate) fn inc_snapshot_appends(&self) {
        self.snapshot_appends_total.increment(1);
    }

    pub(crate) fn inc_persist_failures(&self) {
        self.persist_failures_total.increment(1);
    }

    pub(crate) fn inc_anomalies_flagged(&self) {
        self.anomalies_flagged_total.increment(1);
    }
}
