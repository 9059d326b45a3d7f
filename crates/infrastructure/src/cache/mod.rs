//! Process-local caching for sector configurations
//!
//! The cache stores serialized entities keyed by `sector:<id>` or the
//! `sectors:all` sentinel. Entries expire lazily on access.

pub mod memory;
pub mod metrics;

pub use memory::*;
pub use metrics::*;

use serde::Serialize;
use std::time::Duration;

/// Key prefix shared by every sector cache entry
pub const SECTOR_PREFIX: &str = "sector:";
/// Prefix of the bulk listing namespace
pub const SECTORS_PREFIX: &str = "sectors:";
/// Sentinel key holding the full sector listing
pub const ALL_SECTORS_KEY: &str = "sectors:all";

/// Build cache key for a single sector
pub fn sector_cache_key(sector_id: &str) -> String {
    format!("{SECTOR_PREFIX}{sector_id}")
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

/// Cache store trait for dependency injection
///
/// Operations are synchronous; implementations must never expose a partially
/// written entry.
pub trait CacheStore: Send + Sync {
    /// Get a live value. An expired entry is removed and reported as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Read a live value without touching stats or evicting expired entries
    fn peek(&self, key: &str) -> Option<String>;

    /// Store a value. `Duration::ZERO` means the entry never expires.
    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> bool;

    /// Delete every entry whose key starts with `prefix`
    fn invalidate_prefix(&self, prefix: &str) -> usize;

    fn stats(&self) -> CacheStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_cache_key() {
        assert_eq!(sector_cache_key("pe_technology"), "sector:pe_technology");
        assert!(ALL_SECTORS_KEY.starts_with(SECTORS_PREFIX));
        assert!(!sector_cache_key("pe_technology").starts_with(SECTORS_PREFIX));
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.miss_rate(), 0.25);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
