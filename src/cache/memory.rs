// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory TTL cache shared by all requests of this instance.

use super::{CacheKey, EntryCache};
use crate::error::AppError;
use crate::models::Entry;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Cached entry with expiry information.
#[derive(Clone)]
struct CachedEntry {
    entry: Entry,
    expires_at: Instant,
}

/// DashMap-backed entry cache with per-key expiry and a size bound.
///
/// Writes are last-writer-wins; there is no locking beyond the map shards.
pub struct MemoryCache {
    entries: DashMap<CacheKey, CachedEntry>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
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

    /// Make room for one more key: drop expired values first, then the value
    /// closest to expiry.
    fn make_room(&self, now: Instant) {
        if self.entries.len() < self.max_entries {
            return;
        }

        self.entries.retain(|_, cached| cached.expires_at > now);
        if self.entries.len() < self.max_entries {
            return;
        }

        let soonest = self
            .entries
            .iter()
            .min_by_key(|cached| cached.expires_at)
            .map(|cached| cached.key().clone());

        if let Some(key) = soonest {
            tracing::debug!(key = %key, "Entry cache full, evicting");
            self.entries.remove(&key);
        }
    }
}

#[async_trait]
impl EntryCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Entry>, AppError> {
        let now = Instant::now();

        if let Some(cached) = self.entries.get(key) {
            if now < cached.expires_at {
                return Ok(Some(cached.entry.clone()));
            }
        }

        // Expired: drop it unless a writer replaced it in the meantime.
        self.entries.remove_if(key, |_, cached| cached.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, entry: &Entry, ttl: Duration) -> Result<(), AppError> {
        let now = Instant::now();
        if !self.entries.contains_key(key) {
            self.make_room(now);
        }

        self.entries.insert(
            key.clone(),
            CachedEntry {
                entry: entry.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryFields;
    use chrono::NaiveDate;

    fn key(day: u32) -> CacheKey {
        CacheKey::new("u1", NaiveDate::from_ymd_opt(2025, 7, day).unwrap())
    }

    fn entry(day: u32) -> Entry {
        Entry::new(
            format!("id-{day}"),
            "u1",
            NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            &EntryFields {
                rose: Some("sunny".to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new(10);
        let stored = entry(1);
        cache
            .set(&key(1), &stored, Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(cache.get(&key(1)).await.unwrap(), Some(stored));
        assert_eq!(cache.get(&key(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_value_is_dropped() {
        let cache = MemoryCache::new(10);
        cache
            .set(&key(1), &entry(1), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get(&key(1)).await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_value() {
        let cache = MemoryCache::new(10);
        cache
            .set(&key(1), &entry(1), Duration::from_secs(600))
            .await
            .unwrap();
        cache.delete(&key(1)).await.unwrap();

        assert_eq!(cache.get(&key(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_soonest_expiry() {
        let cache = MemoryCache::new(2);
        cache
            .set(&key(1), &entry(1), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set(&key(2), &entry(2), Duration::from_secs(600))
            .await
            .unwrap();
        cache
            .set(&key(3), &entry(3), Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)).await.unwrap(), None);
        assert!(cache.get(&key(2)).await.unwrap().is_some());
        assert!(cache.get(&key(3)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = MemoryCache::new(1);
        cache
            .set(&key(1), &entry(1), Duration::from_secs(600))
            .await
            .unwrap();
        cache
            .set(&key(1), &entry(1), Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(cache.len(), 1);
    }
}
