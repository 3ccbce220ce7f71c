//! Coalescing read-through cache for store-scoped review listings
//!
//! Lookup order:
//! 1. key-value cache (`get`); a hit is returned as is
//! 2. on "absent", join the coalescing slot for the key
//! 3. the slot's fetch re-reads the cache, then queries the search index,
//!    stores the raw page with a fixed TTL and returns the bytes
//!
//! A cache backend error never falls through to the search index.

use review_storage::{
    CacheGateway, ReviewView, SearchFilter, SearchGateway, SearchPage, StorageError,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::coalesce::CoalescingGroup;
use crate::context::RequestContext;
use crate::error::{Result, ReviewError};
use crate::metrics::ListingCacheMetrics;

pub const DEFAULT_INDEX: &str = "review";
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// `<index>:<store_id>:<offset>:<limit>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingKey {
    pub index: String,
    pub store_id: i64,
    pub offset: usize,
    pub limit: usize,
}

impl ListingKey {
    pub fn new(index: impl Into<String>, store_id: i64, offset: usize, limit: usize) -> Self {
        Self {
            index: index.into(),
            store_id,
            offset,
            limit,
        }
    }

    pub fn parse(key: &str) -> Result<Self> {
        let malformed = || ReviewError::MalformedCacheKey(key.to_string());

        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() < 4 {
            return Err(malformed());
        }

        Ok(Self {
            index: parts[0].to_string(),
            store_id: parts[1].parse().map_err(|_| malformed())?,
            offset: parts[2].parse().map_err(|_| malformed())?,
            limit: parts[3].parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.index, self.store_id, self.offset, self.limit
        )
    }
}

/// Everything the detached fetch task needs, detached from `&self`
#[derive(Clone)]
struct Origin {
    cache: Arc<dyn CacheGateway>,
    search: Arc<dyn SearchGateway>,
    ttl: Duration,
    metrics: Option<ListingCacheMetrics>,
}

impl Origin {
    async fn fetch(self, key: String) -> Result<Arc<[u8]>> {
        // Another fetch may have filled the entry since our miss
        if let Some(bytes) = self.cache.get(&key).await? {
            return Ok(Arc::from(bytes));
        }

        let listing = ListingKey::parse(&key)?;
        let filter = SearchFilter::term("store_id", listing.store_id.to_string());
        let page = self
            .search
            .search(&listing.index, &filter, listing.offset, listing.limit)
            .await?;
        let hit_rate = self.metrics.as_ref().map(|metrics| {
            metrics.origin_fetches.inc();
            metrics.hit_rate()
        });
        debug!(
            key = %key,
            total = page.total,
            hits = page.hits.len(),
            hit_rate = hit_rate.unwrap_or_default(),
            "Fetched listing from search index"
        );

        let bytes = serde_json::to_vec(&page).map_err(StorageError::from)?;
        self.cache.set(&key, bytes.clone(), self.ttl).await?;
        Ok(Arc::from(bytes))
    }
}

pub struct ListingCache {
    origin: Origin,
    group: CoalescingGroup<Arc<[u8]>>,
    index: String,
    fetch_timeout: Duration,
}

impl ListingCache {
    pub fn new(cache: Arc<dyn CacheGateway>, search: Arc<dyn SearchGateway>) -> Self {
        Self {
            origin: Origin {
                cache,
                search,
                ttl: DEFAULT_TTL,
                metrics: None,
            },
            group: CoalescingGroup::new(),
            index: DEFAULT_INDEX.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.origin.ttl = ttl;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: ListingCacheMetrics) -> Self {
        self.origin.metrics = Some(metrics);
        self
    }

    /// Share a coalescing group with other caches (or a test)
    pub fn with_group(mut self, group: CoalescingGroup<Arc<[u8]>>) -> Self {
        self.group = group;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.origin.ttl
    }

    /// One page of review documents for a store
    pub async fn list_by_store(
        &self,
        ctx: &RequestContext,
        store_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReviewView>> {
        let key = ListingKey::new(&self.index, store_id, offset, limit).to_string();

        let bytes: Arc<[u8]> = match ctx.guard(self.origin.cache.get(&key)).await? {
            Some(bytes) => {
                self.count(|m| m.hits.inc());
                Arc::from(bytes)
            }
            None => {
                self.count(|m| m.misses.inc());
                self.fetch_shared(ctx, key).await?
            }
        };

        let page: SearchPage = serde_json::from_slice(&bytes).map_err(StorageError::from)?;
        Ok(self.decode_hits(page))
    }

    async fn fetch_shared(&self, ctx: &RequestContext, key: String) -> Result<Arc<[u8]>> {
        let origin = self.origin.clone();
        let timeout = self.fetch_timeout;
        let fetch_key = key.clone();

        let (shared, leader) = self.group.join(&key, move || async move {
            tokio::time::timeout(timeout, origin.fetch(fetch_key))
                .await
                .unwrap_or(Err(ReviewError::DeadlineExceeded))
        });
        if !leader {
            self.count(|m| m.coalesced.inc());
        }
        debug!(key = %key, leader, "Waiting on listing fetch");

        ctx.guard(shared).await
    }

    fn decode_hits(&self, page: SearchPage) -> Vec<ReviewView> {
        let mut views = Vec::with_capacity(page.hits.len());
        for hit in page.hits {
            match serde_json::from_value::<ReviewView>(hit) {
                Ok(view) => views.push(view),
                Err(e) => {
                    warn!("Skipping undecodable review document: {}", e);
                    self.count(|m| m.dropped_records.inc());
                }
            }
        }
        views
    }

    fn count(&self, f: impl FnOnce(&ListingCacheMetrics)) {
        if let Some(metrics) = &self.origin.metrics {
            f(metrics);
        }
    }
}
