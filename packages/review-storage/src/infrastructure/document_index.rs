//! In-Memory Document Index (search gateway)
//!
//! Holds raw JSON documents per index and answers term-filtered, paginated
//! queries in insertion order. Documents are indexed in the `ReviewView`
//! shape, so every field compares as a string.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::Review;
use crate::domain::ports::{SearchFilter, SearchGateway, SearchPage};
use crate::domain::view::ReviewView;
use crate::error::Result;

#[derive(Clone, Default)]
pub struct MemoryDocumentIndex {
    indices: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryDocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw document
    pub fn index_document(&self, index: &str, document: Value) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .push(document);
    }

    /// Index a review in its view shape, replacing any document with the same
    /// `review_id`
    pub fn index_review(&self, index: &str, review: &Review) -> Result<()> {
        let document = serde_json::to_value(ReviewView::from_review(review))?;
        let review_id = review.review_id.to_string();

        let mut indices = self.indices.write();
        let documents = indices.entry(index.to_string()).or_default();
        match documents
            .iter_mut()
            .find(|doc| field_matches(doc, "review_id", &review_id))
        {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(())
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.indices.read().get(index).map_or(0, Vec::len)
    }
}

fn field_matches(document: &Value, field: &str, expected: &str) -> bool {
    match document.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

#[async_trait]
impl SearchGateway for MemoryDocumentIndex {
    async fn search(
        &self,
        index: &str,
        filter: &SearchFilter,
        offset: usize,
        limit: usize,
    ) -> Result<SearchPage> {
        let indices = self.indices.read();
        let Some(documents) = indices.get(index) else {
            return Ok(SearchPage::default());
        };

        let matched: Vec<&Value> = documents
            .iter()
            .filter(|doc| {
                filter
                    .terms
                    .iter()
                    .all(|(field, value)| field_matches(doc, field, value))
            })
            .collect();

        Ok(SearchPage {
            total: matched.len() as u64,
            hits: matched
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_term_filter_and_paging() {
        let index = MemoryDocumentIndex::new();
        for i in 0..5 {
            index.index_document("review", json!({"review_id": i.to_string(), "store_id": "3"}));
        }
        index.index_document("review", json!({"review_id": "99", "store_id": "4"}));

        let page = index
            .search("review", &SearchFilter::term("store_id", "3"), 1, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.hits.len(), 2);
        assert_eq!(page.hits[0]["review_id"], "1");
    }

    #[tokio::test]
    async fn test_numeric_field_matches_decimal_string() {
        let index = MemoryDocumentIndex::new();
        index.index_document("review", json!({"store_id": 3}));

        let page = index
            .search("review", &SearchFilter::term("store_id", "3"), 0, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_index_is_empty() {
        let index = MemoryDocumentIndex::new();
        let page = index
            .search("missing", &SearchFilter::term("store_id", "3"), 0, 10)
            .await
            .unwrap();
        assert_eq!(page, SearchPage::default());
    }

    #[test]
    fn test_index_review_replaces_by_review_id() {
        let index = MemoryDocumentIndex::new();
        let mut review = Review::new(1, 9001, 7, 3);
        index.index_review("review", &review).unwrap();
        review.has_reply = true;
        index.index_review("review", &review).unwrap();

        assert_eq!(index.document_count("review"), 1);
    }
}
