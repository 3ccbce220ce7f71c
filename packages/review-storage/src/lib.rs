//! review-storage: entities and gateways for the review backend
//!
//! ## Layers
//!
//! - **domain**: `Review`, `Reply`, `Appeal`, the string-typed `ReviewView`
//!   used by the document store, and the gateway ports
//! - **infrastructure**: SQLite row store, moka-backed cache, in-memory
//!   document index, snowflake ids
//!
//! ## Usage
//!
//! ```rust,ignore
//! use review_storage::{Review, ReviewStore, SqliteReviewStore};
//!
//! let store = SqliteReviewStore::in_memory()?;
//! let saved = store.insert_review(&Review::new(1, 9001, 7, 3)).await?;
//!
//! // Multi-row changes commit together
//! store
//!     .transaction(|tx| {
//!         tx.insert_reply(&reply)?;
//!         tx.mark_replied(reply.review_id)
//!     })
//!     .await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    Appeal, AppealStatus, CacheGateway, IdGenerator, Media, Reply, Review, ReviewAudit,
    ReviewStatus, ReviewStore, ReviewTx, ReviewView, SearchFilter, SearchGateway, SearchPage,
    VIEW_TIME_FORMAT,
};

pub use infrastructure::{MemoryCacheGateway, MemoryDocumentIndex, Snowflake};

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteReviewStore;
