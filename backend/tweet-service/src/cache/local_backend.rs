use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::warn;

use super::{CacheBackend, CacheResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Default entry cap for the in-process backend
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// In-process cache backend for single-node deployments and tests
pub struct LocalCacheBackend {
    entries: DashMap<String, Entry>,
    max_entries: usize,
}

impl Default for LocalCacheBackend {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl LocalCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make room for one more entry: drop expired entries first, then
    /// evict 10% (at least one) if the cap is still reached.
    fn enforce_limits(&self, incoming: &str) {
        if self.entries.len() < self.max_entries || self.entries.contains_key(incoming) {
            return;
        }

        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
        if self.entries.len() < self.max_entries {
            return;
        }

        let evict_count = (self.entries.len() / 10).max(1);
        warn!(
            current_entries = self.entries.len(),
            evict_count, "Local cache limit reached, evicting entries"
        );

        let victims: Vec<String> = self
            .entries
            .iter()
            .take(evict_count)
            .map(|e| e.key().clone())
            .collect();
        for key in victims {
            self.entries.remove(&key);
        }
    }
}

#[async_trait::async_trait]
impl CacheBackend for LocalCacheBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired entries are evicted lazily
        self.entries.remove_if(key, |_, e| e.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.enforce_limits(key);
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let backend = LocalCacheBackend::new();
        backend
            .set("k", "v".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn delete_prefix_counts_removed_keys() {
        let backend = LocalCacheBackend::new();
        let ttl = Duration::from_secs(60);
        backend.set("a:1", "x".into(), ttl).await.unwrap();
        backend.set("a:2", "x".into(), ttl).await.unwrap();
        backend.set("b:1", "x".into(), ttl).await.unwrap();

        assert_eq!(backend.delete_prefix("a:").await.unwrap(), 2);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_swept_when_full() {
        let backend = LocalCacheBackend::with_max_entries(100);
        for i in 0..100 {
            backend
                .set(&format!("old:{}", i), "x".into(), Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        backend
            .set("fresh", "y".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("fresh").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn live_entries_never_exceed_cap() {
        let backend = LocalCacheBackend::with_max_entries(50);
        let ttl = Duration::from_secs(60);
        for i in 0..500 {
            backend.set(&format!("k:{}", i), "x".into(), ttl).await.unwrap();
            assert!(backend.len() <= 50);
        }
        assert_eq!(backend.get("k:499").await.unwrap().as_deref(), Some("x"));

        // Overwriting an existing key at the cap evicts nothing
        let before = backend.len();
        backend.set("k:499", "z".into(), ttl).await.unwrap();
        assert_eq!(backend.len(), before);
    }
}
