//! In-process cache gateway backed by moka
//!
//! Stands in for a remote key-value store. Every entry carries its own TTL,
//! applied through a per-entry `Expiry` policy rather than one cache-wide
//! `time_to_live`.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::ports::CacheGateway;
use crate::error::Result;

#[derive(Clone)]
struct CacheEntry {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// moka-backed `CacheGateway`
#[derive(Clone)]
pub struct MemoryCacheGateway {
    cache: Cache<String, CacheEntry>,
}

impl MemoryCacheGateway {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();
        Self { cache }
    }

    /// Drop one entry (the cache is never authoritative)
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }
}

#[async_trait]
impl CacheGateway for MemoryCacheGateway {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.get(key).await.map(|entry| entry.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            bytes: Arc::from(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let cache = MemoryCacheGateway::new(16);
        assert_eq!(cache.get("review:1:0:10").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCacheGateway::new(16);
        cache
            .set("review:1:0:10", b"page".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("review:1:0:10").await.unwrap(),
            Some(b"page".to_vec())
        );
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemoryCacheGateway::new(16);
        cache
            .set("short", b"a".to_vec(), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("long", b"b".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MemoryCacheGateway::new(16);
        cache
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.invalidate("k").await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
