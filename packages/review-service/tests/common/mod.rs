//! Shared fixtures and gateway doubles for review-service integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use review_service::{ListingCache, NewReview, ReviewUsecase};
use review_storage::{
    CacheGateway, MemoryCacheGateway, MemoryDocumentIndex, Review, SearchFilter, SearchGateway,
    SearchPage, Snowflake, SqliteReviewStore, StorageError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const INDEX: &str = "review";

/// Search double that counts calls and answers after a delay
pub struct CountingSearch {
    pub index: MemoryDocumentIndex,
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl CountingSearch {
    pub fn new(delay: Duration) -> Self {
        Self {
            index: MemoryDocumentIndex::new(),
            calls: AtomicUsize::new(0),
            delay,
            fail: false,
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            fail: true,
            ..Self::new(delay)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchGateway for CountingSearch {
    async fn search(
        &self,
        index: &str,
        filter: &SearchFilter,
        offset: usize,
        limit: usize,
    ) -> review_storage::Result<SearchPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(StorageError::search("index unavailable"));
        }
        self.index.search(index, filter, offset, limit).await
    }
}

/// Cache double whose reads or writes fail
pub struct BrokenCache {
    pub fail_get: bool,
    pub fail_set: bool,
}

#[async_trait]
impl CacheGateway for BrokenCache {
    async fn get(&self, _key: &str) -> review_storage::Result<Option<Vec<u8>>> {
        if self.fail_get {
            return Err(StorageError::cache("connection refused"));
        }
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> review_storage::Result<()> {
        if self.fail_set {
            return Err(StorageError::cache("read-only replica"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub usecase: ReviewUsecase<SqliteReviewStore>,
    pub store: Arc<SqliteReviewStore>,
    pub cache: Arc<MemoryCacheGateway>,
    pub search: Arc<CountingSearch>,
}

pub fn harness() -> Harness {
    let store = Arc::new(SqliteReviewStore::in_memory().unwrap());
    let cache = Arc::new(MemoryCacheGateway::new(1_000));
    let search = Arc::new(CountingSearch::new(Duration::ZERO));
    let ids = Arc::new(Snowflake::new("2024-01-01", 1).unwrap());

    let listing = ListingCache::new(cache.clone(), search.clone());
    let usecase = ReviewUsecase::new(store.clone(), ids, listing);

    Harness {
        usecase,
        store,
        cache,
        search,
    }
}

pub fn new_review(order_id: i64, user_id: i64, store_id: i64) -> NewReview {
    NewReview {
        user_id,
        order_id,
        store_id,
        score: 5,
        service_score: 4,
        express_score: 5,
        content: format!("order {} arrived", order_id),
        ..Default::default()
    }
}

/// Index `count` reviews of one store directly (no row store involved)
pub fn seed_index(index: &MemoryDocumentIndex, store_id: i64, count: i64) -> Vec<Review> {
    (1..=count)
        .map(|i| {
            let mut review = Review::new(1_000 + i, 9_000 + i, 7, store_id);
            review.id = i;
            review.content = format!("review {}", i);
            index.index_review(INDEX, &review).unwrap();
            review
        })
        .collect()
}
