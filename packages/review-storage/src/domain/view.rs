//! Review view type for the document-store boundary
//!
//! Documents in the search index carry every integer as a decimal string and
//! timestamps as `YYYY-MM-DD HH:MM:SS`. `ReviewView` mirrors that shape so a
//! hit deserializes without precision loss; `into_review` decodes it back into
//! the canonical [`Review`] and fails with a decode error on any mismatch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Media, Review, ReviewStatus};
use crate::error::{Result, StorageError};

/// Fixed literal timestamp layout used by indexed documents
pub const VIEW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewView {
    #[serde(default)]
    pub id: String,
    pub review_id: String,
    pub order_id: String,
    pub user_id: String,
    pub store_id: String,
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub spu_id: String,
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub service_score: String,
    #[serde(default)]
    pub express_score: String,
    #[serde(default)]
    pub content: String,
    /// JSON array text, e.g. `["a.jpg"]`
    #[serde(default)]
    pub pic_info: String,
    #[serde(default)]
    pub video_info: String,
    #[serde(default)]
    pub has_media: String,
    #[serde(default)]
    pub anonymous: String,
    pub status: String,
    #[serde(default)]
    pub is_default: String,
    #[serde(default)]
    pub has_reply: String,
    #[serde(default)]
    pub op_user: String,
    #[serde(default)]
    pub op_reason: String,
    #[serde(default)]
    pub op_remarks: String,
    pub create_at: String,
    pub update_at: String,
}

impl ReviewView {
    /// Encode a review into its document shape
    pub fn from_review(review: &Review) -> Self {
        Self {
            id: review.id.to_string(),
            review_id: review.review_id.to_string(),
            order_id: review.order_id.to_string(),
            user_id: review.user_id.to_string(),
            store_id: review.store_id.to_string(),
            sku_id: review.sku_id.to_string(),
            spu_id: review.spu_id.to_string(),
            score: review.score.to_string(),
            service_score: review.service_score.to_string(),
            express_score: review.express_score.to_string(),
            content: review.content.clone(),
            pic_info: encode_list(&review.media.pictures),
            video_info: encode_list(&review.media.videos),
            has_media: encode_flag(review.has_media()),
            anonymous: encode_flag(review.anonymous),
            status: review.status.code().to_string(),
            is_default: encode_flag(review.is_default),
            has_reply: encode_flag(review.has_reply),
            op_user: review.op_user.clone(),
            op_reason: review.op_reason.clone(),
            op_remarks: review.op_remarks.clone(),
            create_at: format_time(&review.created_at),
            update_at: format_time(&review.updated_at),
        }
    }

    /// Decode into the canonical entity
    pub fn into_review(self) -> Result<Review> {
        let status_code: i32 = parse_required("status", &self.status)?;
        let status = ReviewStatus::from_code(status_code)
            .ok_or_else(|| StorageError::decode("status", &self.status))?;

        Ok(Review {
            id: parse_optional("id", &self.id)?,
            review_id: parse_required("review_id", &self.review_id)?,
            order_id: parse_required("order_id", &self.order_id)?,
            user_id: parse_required("user_id", &self.user_id)?,
            store_id: parse_required("store_id", &self.store_id)?,
            sku_id: parse_optional("sku_id", &self.sku_id)?,
            spu_id: parse_optional("spu_id", &self.spu_id)?,
            score: parse_optional("score", &self.score)?,
            service_score: parse_optional("service_score", &self.service_score)?,
            express_score: parse_optional("express_score", &self.express_score)?,
            media: Media::new(
                decode_list("pic_info", &self.pic_info)?,
                decode_list("video_info", &self.video_info)?,
            ),
            anonymous: decode_flag("anonymous", &self.anonymous)?,
            status,
            is_default: decode_flag("is_default", &self.is_default)?,
            has_reply: decode_flag("has_reply", &self.has_reply)?,
            created_at: parse_time("create_at", &self.create_at)?,
            updated_at: parse_time("update_at", &self.update_at)?,
            content: self.content,
            op_user: self.op_user,
            op_reason: self.op_reason,
            op_remarks: self.op_remarks,
        })
    }
}

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format(VIEW_TIME_FORMAT).to_string()
}

pub fn parse_time(field: &str, value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, VIEW_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StorageError::decode(field, value).with_source(e))
}

fn parse_required<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| StorageError::decode(field, value))
}

// Absent optional numerics are indexed as empty strings
fn parse_optional<T: std::str::FromStr + Default>(field: &str, value: &str) -> Result<T> {
    if value.is_empty() {
        return Ok(T::default());
    }
    parse_required(field, value)
}

fn encode_flag(flag: bool) -> String {
    if flag { "1" } else { "0" }.to_string()
}

fn decode_flag(field: &str, value: &str) -> Result<bool> {
    match value {
        "" | "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(StorageError::decode(field, value)),
    }
}

fn encode_list(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    serde_json::to_string(items).unwrap_or_default()
}

fn decode_list(field: &str, value: &str) -> Result<Vec<String>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(value).map_err(|e| StorageError::decode(field, value).with_source(e))
}
