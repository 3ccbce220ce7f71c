//! Domain Models
//!
//! - `Review`: one per order, moderated by operators
//! - `Reply`: at most one per review, written by the review's own store
//! - `Appeal`: a store's request to hide a review, finalized by an operator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Status Codes
// ═══════════════════════════════════════════════════════════════════════════

/// Review moderation status (persisted as its integer code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    PendingAudit,
    Approved,
    Rejected,
    Hidden,
}

impl ReviewStatus {
    pub fn code(&self) -> i32 {
        match self {
            ReviewStatus::PendingAudit => 10,
            ReviewStatus::Approved => 20,
            ReviewStatus::Rejected => 30,
            ReviewStatus::Hidden => 40,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(ReviewStatus::PendingAudit),
            20 => Some(ReviewStatus::Approved),
            30 => Some(ReviewStatus::Rejected),
            40 => Some(ReviewStatus::Hidden),
            _ => None,
        }
    }
}

impl Default for ReviewStatus {
    fn default() -> Self {
        ReviewStatus::PendingAudit
    }
}

/// Appeal status: 10 is pending, anything above is final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub fn code(&self) -> i32 {
        match self {
            AppealStatus::Pending => 10,
            AppealStatus::Approved => 20,
            AppealStatus::Rejected => 30,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(AppealStatus::Pending),
            20 => Some(AppealStatus::Approved),
            30 => Some(AppealStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.code() > AppealStatus::Pending.code()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════

/// Picture and video references attached to a review, reply or appeal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub pictures: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

impl Media {
    pub fn new(pictures: Vec<String>, videos: Vec<String>) -> Self {
        Self { pictures, videos }
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty() && self.videos.is_empty()
    }
}

/// A user's review of one order
///
/// # Identity
///
/// - `review_id`: generated, immutable
/// - `id`: internal row sequence assigned by the row store (0 until persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub review_id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub sku_id: i64,
    pub spu_id: i64,
    /// Overall score
    pub score: i32,
    pub service_score: i32,
    /// Logistics score
    pub express_score: i32,
    pub content: String,
    #[serde(default)]
    pub media: Media,
    pub anonymous: bool,
    pub status: ReviewStatus,
    /// Auto-generated placeholder review
    pub is_default: bool,
    pub has_reply: bool,
    /// Audit metadata, written only by audit
    #[serde(default)]
    pub op_user: String,
    #[serde(default)]
    pub op_reason: String,
    #[serde(default)]
    pub op_remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Create a pending review for an order
    pub fn new(review_id: i64, order_id: i64, user_id: i64, store_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            review_id,
            order_id,
            user_id,
            store_id,
            sku_id: 0,
            spu_id: 0,
            score: 0,
            service_score: 0,
            express_score: 0,
            content: String::new(),
            media: Media::default(),
            anonymous: false,
            status: ReviewStatus::PendingAudit,
            is_default: false,
            has_reply: false,
            op_user: String::new(),
            op_reason: String::new(),
            op_remarks: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// A store's reply to a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub reply_id: i64,
    pub review_id: i64,
    pub store_id: i64,
    pub content: String,
    #[serde(default)]
    pub media: Media,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(
        reply_id: i64,
        review_id: i64,
        store_id: i64,
        content: impl Into<String>,
        media: Media,
    ) -> Self {
        Self {
            reply_id,
            review_id,
            store_id,
            content: content.into(),
            media,
            created_at: Utc::now(),
        }
    }
}

/// A store's appeal against a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub appeal_id: i64,
    pub review_id: i64,
    pub store_id: i64,
    pub status: AppealStatus,
    pub reason: String,
    pub content: String,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub op_user: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appeal {
    /// Create a pending appeal
    pub fn pending(
        appeal_id: i64,
        review_id: i64,
        store_id: i64,
        reason: impl Into<String>,
        content: impl Into<String>,
        media: Media,
    ) -> Self {
        let now = Utc::now();
        Self {
            appeal_id,
            review_id,
            store_id,
            status: AppealStatus::Pending,
            reason: reason.into(),
            content: content.into(),
            media,
            op_user: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
