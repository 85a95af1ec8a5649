//! Explicit TTL cache with tag-based invalidation.
//!
//! The cache is constructed once and injected into [`crate::service::ShopService`];
//! there are no module-level statics. Entries expire `ttl` after insertion and can be
//! dropped early by key or by any of the tags they were inserted with.
//!
//! Every invalidation bumps a generation counter for the key or tag it hit. A load
//! started before an invalidation is returned to its caller but not stored.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
    tags: Vec<String>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    tags: HashMap<String, HashSet<String>>,
    key_generations: HashMap<String, u64>,
    tag_generations: HashMap<String, u64>,
    clears: u64,
}

impl<V> Inner<V> {
    /// Changes whenever `key`, any of `tags`, or the whole cache is invalidated.
    fn generation(&self, key: &str, tags: &[&str]) -> u64 {
        let tag_total: u64 = tags
            .iter()
            .filter_map(|tag| self.tag_generations.get(*tag))
            .sum();
        self.clears + self.key_generations.get(key).copied().unwrap_or(0) + tag_total
    }

    fn store(&mut self, key: &str, value: V, tags: &[&str], expires_at: Instant) {
        self.remove_key(key);
        for tag in tags {
            self.tags
                .entry((*tag).to_string())
                .or_default()
                .insert(key.to_string());
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at,
                tags: tags.iter().map(|t| (*t).to_string()).collect(),
            },
        );
    }

    fn remove_key(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        for tag in &entry.tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
        Some(entry)
    }
}

/// Key-value cache with a fixed TTL and invalidation tags. Cloning shares the storage.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    ttl: Duration,
    inner: Arc<RwLock<Inner<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(Inner {
                entries: HashMap::new(),
                tags: HashMap::new(),
                key_generations: HashMap::new(),
                tag_generations: HashMap::new(),
                clears: 0,
            })),
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a live entry, evicting it if it has expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > Instant::now() => {
                    trace!("Cache hit for '{}'", key);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut inner = self.inner.write().await;
        // Re-check under the write lock; another task may have refreshed it.
        if let Some(entry) = inner.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        inner.remove_key(key);
        debug!("Cache entry '{}' expired", key);
        None
    }

    /// Stores `value` under `key`, replacing any previous entry and its tags.
    pub async fn insert(&self, key: &str, value: V, tags: &[&str]) {
        let mut inner = self.inner.write().await;
        inner.store(key, value, tags, Instant::now() + self.ttl);
        trace!("Cached '{}' with tags {:?}", key, tags);
    }

    /// Returns the cached value, or runs `loader` and caches its successful result.
    ///
    /// Loader errors are passed through and nothing is cached. If the key or one of
    /// `tags` is invalidated while `loader` runs, the loaded value is returned but
    /// not cached, since it may predate the change.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        tags: &[&str],
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        debug!("Cache miss for '{}', loading", key);
        let started = self.inner.read().await.generation(key, tags);
        let value = loader().await?;

        let mut inner = self.inner.write().await;
        if inner.generation(key, tags) == started {
            inner.store(key, value.clone(), tags, Instant::now() + self.ttl);
            trace!("Cached '{}' with tags {:?}", key, tags);
        } else {
            debug!("'{}' was invalidated while loading; not caching", key);
        }
        Ok(value)
    }

    /// Drops a single key. Returns whether it was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.write().await;
        *inner.key_generations.entry(key.to_string()).or_default() += 1;
        inner.remove_key(key).is_some()
    }

    /// Drops every entry inserted with `tag`. Returns how many were removed.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        let mut inner = self.inner.write().await;
        *inner.tag_generations.entry(tag.to_string()).or_default() += 1;
        let keys: Vec<String> = inner
            .tags
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        let removed = keys
            .iter()
            .filter(|key| inner.remove_key(key).is_some())
            .count();
        debug!("Invalidated {} cache entries tagged '{}'", removed, tag);
        removed
    }

    /// Drops everything.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.tags.clear();
        inner.clears += 1;
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, Result};

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("garments:1", vec![1, 2, 3], &["garments:1"]).await;
        assert_eq!(cache.get("garments:1").await, Some(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("garments:1").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("garments:1").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_by_tag_only_hits_tagged_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("active:1", 1, &["shop:1", "garments:1"]).await;
        cache.insert("pipeline:1", 2, &["shop:1"]).await;
        cache.insert("active:2", 3, &["shop:2", "garments:2"]).await;

        assert_eq!(cache.invalidate_tag("garments:1").await, 1);
        assert_eq!(cache.get("active:1").await, None);
        assert_eq!(cache.get("pipeline:1").await, Some(2));

        assert_eq!(cache.invalidate_tag("shop:1").await, 1);
        assert_eq!(cache.get("active:2").await, Some(3));
        assert_eq!(cache.invalidate_tag("unknown").await, 0);
    }

    #[tokio::test]
    async fn test_reinsert_replaces_tags() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 1, &["old"]).await;
        cache.insert("k", 2, &["new"]).await;

        assert_eq!(cache.invalidate_tag("old").await, 0);
        assert_eq!(cache.get("k").await, Some(2));
        assert!(cache.invalidate("k").await);
        assert!(!cache.invalidate("k").await);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_loads_once() -> Result<()> {
        let cache = TtlCache::new(Duration::from_secs(60));
        let mut calls = 0;

        let first = cache
            .get_or_try_insert_with("k", &[], || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            })
            .await?;
        let second = cache
            .get_or_try_insert_with("k", &[], || {
                calls += 1;
                async { Ok::<_, Error>(7) }
            })
            .await?;

        assert_eq!((first, second, calls), (42, 42, 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_loader_errors_are_not_cached() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_try_insert_with("k", &[], || async {
                Err(Error::not_found("order", 9))
            })
            .await;
        assert!(matches!(result, Err(Error::NotFound { id: 9, .. })));
        assert!(cache.is_empty().await);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_invalidation_during_load_discards_the_loaded_value() -> Result<()> {
        let cache: TtlCache<Vec<&str>> = TtlCache::new(Duration::from_secs(60));
        let writer = cache.clone();

        let loaded = cache
            .get_or_try_insert_with("garments:1", &["garments:1"], || async move {
                // A mutation lands while the list is being read
                writer.invalidate_tag("garments:1").await;
                Ok::<_, Error>(vec!["old"])
            })
            .await?;
        assert_eq!(loaded, vec!["old"]);
        assert_eq!(cache.get("garments:1").await, None);

        let fresh = cache
            .get_or_try_insert_with("garments:1", &["garments:1"], || async {
                Ok::<_, Error>(vec!["new"])
            })
            .await?;
        assert_eq!(fresh, vec!["new"]);
        assert_eq!(cache.get("garments:1").await, Some(vec!["new"]));
        Ok(())
    }

    #[tokio::test]
    async fn test_key_invalidation_and_clear_during_load_also_discard() -> Result<()> {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));

        let writer = cache.clone();
        cache
            .get_or_try_insert_with("k", &[], || async move {
                writer.invalidate("k").await;
                Ok::<_, Error>(1)
            })
            .await?;
        assert!(cache.is_empty().await);

        let writer = cache.clone();
        cache
            .get_or_try_insert_with("k", &["t"], || async move {
                writer.clear().await;
                Ok::<_, Error>(2)
            })
            .await?;
        assert!(cache.is_empty().await);

        // Invalidating an unrelated tag does not block caching
        let writer = cache.clone();
        cache
            .get_or_try_insert_with("k", &["t"], || async move {
                writer.invalidate_tag("other").await;
                Ok::<_, Error>(3)
            })
            .await?;
        assert_eq!(cache.get("k").await, Some(3));
        Ok(())
    }
}
