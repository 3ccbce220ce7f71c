//! Gateway Ports (Trait Interfaces)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Row store: SQLite (`SqliteReviewStore`)
//! - Cache: moka (`MemoryCacheGateway`), or any remote key-value store
//! - Search: in-memory document index (`MemoryDocumentIndex`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::models::{Appeal, AppealStatus, Reply, Review, ReviewStatus};
use crate::error::{Result, StorageError};

// ═══════════════════════════════════════════════════════════════════════════
// Identifier Source
// ═══════════════════════════════════════════════════════════════════════════

/// Globally unique, roughly time-ordered 64-bit identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> i64;
}

// ═══════════════════════════════════════════════════════════════════════════
// Row Store
// ═══════════════════════════════════════════════════════════════════════════

/// Audit metadata written by `update_review_audit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewAudit {
    pub review_id: i64,
    pub status: ReviewStatus,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
}

/// Row operations available inside a transaction
///
/// Writes return the number of affected rows so callers can detect a
/// conditional update that matched nothing.
pub trait ReviewTx {
    fn get_review(&mut self, review_id: i64) -> Result<Option<Review>>;

    fn update_review_status(&mut self, review_id: i64, status: ReviewStatus) -> Result<usize>;

    /// Flip `has_reply` from 0 to 1; returns 0 if it was already set
    fn mark_replied(&mut self, review_id: i64) -> Result<usize>;

    fn insert_reply(&mut self, reply: &Reply) -> Result<()>;

    /// Update an appeal matched by `(appeal_id, review_id)`
    fn update_appeal_status(
        &mut self,
        appeal_id: i64,
        review_id: i64,
        status: AppealStatus,
        op_user: &str,
    ) -> Result<usize>;
}

/// Review Store Port (row store gateway)
///
/// The row store is the single source of truth. Multi-row changes go through
/// [`ReviewStore::transaction`]: every write made by `work` commits together,
/// and any error returned by `work` rolls all of them back.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reviews
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a review; returns it with the row sequence filled in
    ///
    /// Fails with `ErrorKind::Conflict` if the order already has a review.
    async fn insert_review(&self, review: &Review) -> Result<Review>;

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>>;

    async fn reviews_by_order(&self, order_id: i64) -> Result<Vec<Review>>;

    /// Newest first by row sequence
    async fn reviews_by_user(&self, user_id: i64, offset: usize, limit: usize)
        -> Result<Vec<Review>>;

    async fn update_review_audit(&self, audit: &ReviewAudit) -> Result<usize>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Replies
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn get_reply(&self, review_id: i64) -> Result<Option<Reply>>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Appeals
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn find_appeal(&self, review_id: i64, store_id: i64) -> Result<Option<Appeal>>;

    /// Insert, or on `review_id` conflict update the mutable fields of a
    /// still-pending appeal from the same store, in one statement.
    ///
    /// Returns `false` when the existing appeal is finalized and nothing was
    /// written.
    async fn upsert_appeal(&self, appeal: &Appeal) -> Result<bool>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Transactions
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn transaction<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn ReviewTx) -> std::result::Result<T, E> + Send,
        T: Send,
        E: From<StorageError> + Send;
}

// ═══════════════════════════════════════════════════════════════════════════
// Search / Document Store
// ═══════════════════════════════════════════════════════════════════════════

/// Equality predicates over document fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub terms: Vec<(String, String)>,
}

impl SearchFilter {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            terms: vec![(field.into(), value.into())],
        }
    }

    pub fn and_term(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }
}

/// One page of raw hits
///
/// This is also the cached value format: `{"total": n, "hits": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total: u64,
    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
}

#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(
        &self,
        index: &str,
        filter: &SearchFilter,
        offset: usize,
        limit: usize,
    ) -> Result<SearchPage>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Key-Value Cache
// ═══════════════════════════════════════════════════════════════════════════

/// Key-value cache with per-entry expiry
///
/// `get` distinguishes "absent" (`Ok(None)`) from a backend failure (`Err`).
#[async_trait]
pub trait CacheGateway: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_terms() {
        let filter = SearchFilter::term("store_id", "3").and_term("status", "20");
        assert_eq!(filter.terms.len(), 2);
        assert_eq!(filter.terms[0], ("store_id".to_string(), "3".to_string()));
    }

    #[test]
    fn test_search_page_wire_format() {
        let page = SearchPage {
            total: 1,
            hits: vec![serde_json::json!({"review_id": "1"})],
        };
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(json, r#"{"total":1,"hits":[{"review_id":"1"}]}"#);

        let decoded: SearchPage = serde_json::from_str(r#"{"total":0}"#).unwrap();
        assert!(decoded.hits.is_empty());
    }
}
