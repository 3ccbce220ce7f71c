//! Service error taxonomy

use review_storage::{ErrorKind, StorageError};
use thiserror::Error;

/// How a transport layer should treat an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Business rule rejected the request
    Rejected,
    /// A backend (row store, cache, search) failed
    Infrastructure,
    /// Deadline or cancellation ended the request
    Cancelled,
    /// Bug or panic inside the service
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Rejected => "rejected",
            ErrorCategory::Infrastructure => "infrastructure",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// Errors returned by the use-case layer and the listing cache
///
/// `Clone` so one shared fetch can hand the same error to every waiter.
#[derive(Debug, Clone, Error)]
pub enum ReviewError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    #[error("order {order_id} already has a review")]
    OrderAlreadyReviewed { order_id: i64 },

    #[error("review {review_id} already has a reply")]
    ReplyAlreadyExists { review_id: i64 },

    #[error("store {store_id} may not reply to review {review_id}")]
    ReplyForbidden { review_id: i64, store_id: i64 },

    #[error("appeal for review {review_id} is already finalized")]
    AppealAlreadyFinalized { review_id: i64 },

    #[error("review {review_id} not found")]
    ReviewNotFound { review_id: i64 },

    #[error("appeal {appeal_id} for review {review_id} not found")]
    AppealNotFound { appeal_id: i64, review_id: i64 },

    #[error("store {store_id} may not appeal review {review_id}")]
    AppealForbidden { review_id: i64, store_id: i64 },

    #[error("malformed cache key '{0}'")]
    MalformedCacheKey(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReviewError::OrderAlreadyReviewed { .. }
            | ReviewError::ReplyAlreadyExists { .. }
            | ReviewError::ReplyForbidden { .. }
            | ReviewError::AppealAlreadyFinalized { .. }
            | ReviewError::ReviewNotFound { .. }
            | ReviewError::AppealNotFound { .. }
            | ReviewError::AppealForbidden { .. } => ErrorCategory::Rejected,
            ReviewError::StoreUnavailable(_) => ErrorCategory::Infrastructure,
            ReviewError::DeadlineExceeded | ReviewError::Cancelled => ErrorCategory::Cancelled,
            ReviewError::MalformedCacheKey(_) | ReviewError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Backend kind for `StoreUnavailable`
    pub fn storage_kind(&self) -> Option<ErrorKind> {
        match self {
            ReviewError::StoreUnavailable(err) => Some(err.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

/// Startup failures from `ReviewService::bootstrap`
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("metrics registration error: {0}")]
    Metrics(#[from] prometheus::Error),
}
