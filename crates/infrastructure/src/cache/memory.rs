use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheStats, CacheStore};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// In-memory TTL cache
///
/// Expiry is measured on the tokio clock so paused-time tests can step over
/// the TTL boundary. Expired entries are only removed when they are read or
/// overwritten.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    expirations: AtomicU64,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn remove_expired(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // 重新检查，另一个写入者可能已经刷新了该条目
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            entries.remove(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(cache_key = key, "cache entry expired");
        }
    }
}

impl CacheStore for TtlCache {
    fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        self.remove_expired(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry { value, expires_at });
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn delete(&self, key: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        self.deletes.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_value_available_before_ttl() {
        let cache = TtlCache::new();
        cache.set("sector:pe_technology", "payload".to_string(), TTL);

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("sector:pe_technology").as_deref(), Some("payload"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_absent_at_ttl() {
        let cache = TtlCache::new();
        cache.set("sector:pe_technology", "payload".to_string(), TTL);

        tokio::time::advance(TTL).await;
        assert_eq!(cache.get("sector:pe_technology"), None);

        // 过期条目在读取时被删除
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_never_expires() {
        let cache = TtlCache::new();
        cache.set("sectors:all", "[]".to_string(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
        assert_eq!(cache.get("sectors:all").as_deref(), Some("[]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_resets_expiry() {
        let cache = TtlCache::new();
        cache.set("k", "v1".to_string(), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        cache.set("k", "v2".to_string(), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("k").as_deref(), Some("v2"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let cache = TtlCache::new();
        cache.set("sector:pe_technology", "payload".to_string(), TTL);

        assert!(cache.delete("sector:pe_technology"));
        assert!(!cache.delete("sector:pe_technology"));
        assert!(!cache.delete("never-set"));
        assert_eq!(cache.get("sector:pe_technology"), None);
    }

    #[test]
    fn test_invalidate_prefix_is_literal_prefix_match() {
        let cache = TtlCache::new();
        cache.set("sectors:all", "[]".to_string(), TTL);
        cache.set("sectors:page:1", "[]".to_string(), TTL);
        cache.set("sector:pe_technology", "payload".to_string(), TTL);
        cache.set("sectors*", "literal".to_string(), TTL);

        assert_eq!(cache.invalidate_prefix("sectors:"), 2);
        assert_eq!(cache.get("sectors:all"), None);
        assert_eq!(cache.get("sector:pe_technology").as_deref(), Some("payload"));
        assert_eq!(cache.get("sectors*").as_deref(), Some("literal"));

        assert_eq!(cache.invalidate_prefix("sectors:"), 0);
    }

    #[test]
    fn test_stats_track_operations() {
        let cache = TtlCache::new();
        cache.set("a", "1".to_string(), TTL);
        cache.get("a");
        cache.get("b");
        cache.delete("a");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peek_leaves_stats_untouched() {
        let cache = TtlCache::new();
        cache.set("sector:pe_technology", "payload".to_string(), Duration::from_secs(10));

        assert_eq!(cache.peek("sector:pe_technology").as_deref(), Some("payload"));
        assert_eq!(cache.peek("sector:pe_healthcare"), None);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.peek("sector:pe_technology"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.expirations, 0);
        // 过期条目留给下一次 get 清理
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_concurrent_writers_never_tear_entries() {
        let cache = std::sync::Arc::new(TtlCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        cache.set("shared", format!("value-{i}"), TTL);
                        if let Some(value) = cache.get("shared") {
                            assert!(value.starts_with("value-"));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
