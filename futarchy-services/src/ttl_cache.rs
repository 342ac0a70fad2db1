//! In-memory expiry cache

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Map whose entries expire `ttl` after they were stored.
///
/// Reads hand out clones; stored values are only ever replaced, never
/// mutated in place.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`. An expired entry is removed and reported as a
    /// miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!("[{}] hit {:?}", self.name, key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            debug!("[{}] expired {:?}", self.name, key);
        } else {
            debug!("[{}] miss {:?}", self.name, key);
        }
        None
    }

    pub fn set(&self, key: K, value: V) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop every expired entry, including keys that are never read again.
    /// Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!("[{}] purged {} expired entries", self.name, purged);
        }
        purged
    }

    /// Stored entries, including ones that have expired but not been read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlCache<String, u32> {
        TtlCache::new("test", Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served() {
        let cache = cache();
        cache.set("a".to_string(), 1);
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = cache();
        cache.set("a".to_string(), 1);
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_restarts_ttl() {
        let cache = cache();
        cache.set("a".to_string(), 1);
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.set("a".to_string(), 2);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_unread_expired_entries() {
        let cache = cache();
        cache.set("old".to_string(), 1);
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.set("new".to_string(), 2);
        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new".to_string()), Some(2));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_clear_and_remove() {
        let cache = cache();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.remove(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
