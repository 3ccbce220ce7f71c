//! review-service: moderation engine and cached store listings
//!
//! ## Components
//!
//! - [`ReviewUsecase`]: review/appeal/reply state machine over a
//!   [`ReviewStore`](review_storage::ReviewStore)
//! - [`ListingCache`]: read-through cache (key-value cache, then search index)
//!   with per-key request coalescing
//! - [`RequestContext`]: deadline and cancellation for every backend call
//! - [`ServiceConfig`], [`telemetry::init_tracing`], [`ListingCacheMetrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use review_service::{RequestContext, ReviewService, ServiceConfig};
//!
//! review_service::telemetry::init_tracing("review_service=debug");
//! let service = ReviewService::bootstrap(&ServiceConfig::from_yaml("review.yaml")?)?;
//!
//! let ctx = RequestContext::with_timeout(Duration::from_secs(2));
//! let page = service.usecase.list_by_store(&ctx, 3, 1, 10).await?;
//! ```

pub mod coalesce;
pub mod config;
pub mod context;
pub mod error;
pub mod listing_cache;
pub mod metrics;
pub mod telemetry;
pub mod usecase;

pub use coalesce::CoalescingGroup;
pub use config::{ConfigError, PagingConfig, ServiceConfig};
pub use context::RequestContext;
pub use error::{BootstrapError, ErrorCategory, Result, ReviewError};
pub use listing_cache::{ListingCache, ListingKey};
pub use metrics::ListingCacheMetrics;
pub use usecase::{
    AppealParam, AuditAppealParam, AuditParam, NewReview, ReplyParam, ReviewUsecase,
};

use prometheus::Registry;
use review_storage::{
    MemoryCacheGateway, MemoryDocumentIndex, Review, Snowflake, SqliteReviewStore,
};
use std::sync::Arc;
use tracing::info;

/// Wired service: SQLite row store, moka cache, in-memory document index
pub struct ReviewService {
    pub usecase: ReviewUsecase<SqliteReviewStore>,
    pub cache: Arc<MemoryCacheGateway>,
    pub index: Arc<MemoryDocumentIndex>,
    pub metrics: ListingCacheMetrics,
    pub registry: Registry,
    index_name: String,
}

impl ReviewService {
    pub fn bootstrap(config: &ServiceConfig) -> std::result::Result<Self, BootstrapError> {
        config.validate()?;

        let store = match &config.database.path {
            Some(path) => SqliteReviewStore::open(path)?,
            None => SqliteReviewStore::in_memory()?,
        };
        let ids = Snowflake::new(
            &config.id_generator.start_date,
            config.id_generator.machine_id,
        )?;

        let registry = Registry::new();
        let metrics = ListingCacheMetrics::new(&registry)?;

        let cache = Arc::new(MemoryCacheGateway::new(config.cache.max_entries));
        let index = Arc::new(MemoryDocumentIndex::new());
        let listing = ListingCache::new(cache.clone(), index.clone())
            .with_index(config.search.index.clone())
            .with_ttl(config.cache.ttl())
            .with_fetch_timeout(config.cache.fetch_timeout())
            .with_metrics(metrics.clone());

        let usecase = ReviewUsecase::new(Arc::new(store), Arc::new(ids), listing)
            .with_paging(config.paging);

        info!(
            database = ?config.database.path,
            index = %config.search.index,
            machine_id = config.id_generator.machine_id,
            "Review service ready"
        );

        Ok(Self {
            usecase,
            cache,
            index,
            metrics,
            registry,
            index_name: config.search.index.clone(),
        })
    }

    /// Push a review into the document index
    ///
    /// Index sync is external to the use cases; this is the hook a sync job
    /// (or a test) calls.
    pub fn index_review(&self, review: &Review) -> review_storage::Result<()> {
        self.index.index_review(&self.index_name, review)
    }
}
