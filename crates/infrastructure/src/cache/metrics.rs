//! Sector cache metrics
//!
//! Handles are resolved against the globally installed recorder when the
//! collector is created, so it must be built after the exporter is installed.

use metrics::{counter, histogram, Counter, Histogram};

/// Metrics collector for the sector configuration cache
#[derive(Clone)]
pub struct CacheMetrics {
    hits: Counter,
    misses: Counter,
    store_loads: Counter,
    store_failures: Counter,
    contract_violations: Counter,
    invalidations: Counter,
    store_load_duration: Histogram,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: counter!("orgair_sector_cache_hits_total"),
            misses: counter!("orgair_sector_cache_misses_total"),
            store_loads: counter!("orgair_sector_cache_store_loads_total"),
            store_failures: counter!("orgair_sector_cache_store_failures_total"),
            contract_violations: counter!("orgair_sector_cache_contract_violations_total"),
            invalidations: counter!("orgair_sector_cache_invalidations_total"),
            store_load_duration: histogram!("orgair_sector_cache_store_load_duration_seconds"),
        }
    }

    pub fn record_hit(&self) {
        self.hits.increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.increment(1);
    }

    /// Record a completed round-trip to the store
    pub fn record_store_load(&self, duration_seconds: f64) {
        self.store_loads.increment(1);
        self.store_load_duration.record(duration_seconds);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.increment(1);
    }

    pub fn record_contract_violation(&self) {
        self.contract_violations.increment(1);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.increment(1);
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}
