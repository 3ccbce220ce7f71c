//! Infrastructure layer - gateway adapters
//!
//! - `sqlite`: row store
//! - `memory_cache`: key-value cache with per-entry TTL
//! - `document_index`: term-filtered search over JSON documents
//! - `snowflake`: identifier source

pub mod document_index;
pub mod memory_cache;
pub mod snowflake;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use document_index::MemoryDocumentIndex;
pub use memory_cache::MemoryCacheGateway;
pub use snowflake::Snowflake;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteReviewStore;
