//! Review use cases: creation, moderation, appeals, replies, listings
//!
//! Entity rules enforced here:
//! - one review per order
//! - at most one reply per review, only from the review's own store
//! - one appeal lifeline per review; a finalized appeal blocks new ones
//! - approving an appeal hides the review in the same transaction
//! - inserting a reply and setting `has_reply` happen in one transaction

use review_storage::{
    Appeal, AppealStatus, IdGenerator, Media, Reply, Review, ReviewAudit, ReviewStatus,
    ReviewStore,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::PagingConfig;
use crate::context::RequestContext;
use crate::error::{Result, ReviewError};
use crate::listing_cache::ListingCache;

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewReview {
    pub user_id: i64,
    pub order_id: i64,
    pub store_id: i64,
    pub sku_id: i64,
    pub spu_id: i64,
    pub score: i32,
    pub service_score: i32,
    pub express_score: i32,
    pub content: String,
    pub media: Media,
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditParam {
    pub review_id: i64,
    pub status: ReviewStatus,
    pub op_user: String,
    pub op_reason: String,
    pub op_remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppealParam {
    pub review_id: i64,
    pub store_id: i64,
    pub reason: String,
    pub content: String,
    pub media: Media,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditAppealParam {
    pub appeal_id: i64,
    pub review_id: i64,
    pub status: AppealStatus,
    pub op_user: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyParam {
    pub review_id: i64,
    pub store_id: i64,
    pub content: String,
    pub media: Media,
}

// ═══════════════════════════════════════════════════════════════════════════
// Use cases
// ═══════════════════════════════════════════════════════════════════════════

pub struct ReviewUsecase<S: ReviewStore> {
    store: Arc<S>,
    ids: Arc<dyn IdGenerator>,
    listing: ListingCache,
    paging: PagingConfig,
}

impl<S: ReviewStore> ReviewUsecase<S> {
    pub fn new(store: Arc<S>, ids: Arc<dyn IdGenerator>, listing: ListingCache) -> Self {
        Self {
            store,
            ids,
            listing,
            paging: PagingConfig::default(),
        }
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reviews
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub async fn create_review(&self, ctx: &RequestContext, param: NewReview) -> Result<Review> {
        debug!(order_id = param.order_id, user_id = param.user_id, "create_review");

        let existing = ctx.guard(self.store.reviews_by_order(param.order_id)).await?;
        if !existing.is_empty() {
            return Err(ReviewError::OrderAlreadyReviewed {
                order_id: param.order_id,
            });
        }

        let mut review = Review::new(
            self.ids.next_id(),
            param.order_id,
            param.user_id,
            param.store_id,
        );
        review.sku_id = param.sku_id;
        review.spu_id = param.spu_id;
        review.score = param.score;
        review.service_score = param.service_score;
        review.express_score = param.express_score;
        review.content = param.content;
        review.media = param.media;
        review.anonymous = param.anonymous;

        // The unique index on order_id catches a concurrent creator
        match ctx.guard(self.store.insert_review(&review)).await {
            Err(ReviewError::StoreUnavailable(err)) if err.is_conflict() => {
                Err(ReviewError::OrderAlreadyReviewed {
                    order_id: param.order_id,
                })
            }
            other => other,
        }
    }

    /// Set status and audit metadata; any known status is accepted
    pub async fn audit_review(&self, ctx: &RequestContext, param: AuditParam) -> Result<()> {
        debug!(review_id = param.review_id, status = ?param.status, "audit_review");

        let audit = ReviewAudit {
            review_id: param.review_id,
            status: param.status,
            op_user: param.op_user,
            op_reason: param.op_reason,
            op_remarks: param.op_remarks,
        };
        let changed = ctx.guard(self.store.update_review_audit(&audit)).await?;
        if changed == 0 {
            return Err(ReviewError::ReviewNotFound {
                review_id: param.review_id,
            });
        }
        Ok(())
    }

    pub async fn get_review(&self, ctx: &RequestContext, review_id: i64) -> Result<Review> {
        debug!(review_id, "get_review");

        ctx.guard(self.store.get_review(review_id))
            .await?
            .ok_or(ReviewError::ReviewNotFound { review_id })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Appeals
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Create an appeal, or update a still-pending one in place
    pub async fn create_appeal(&self, ctx: &RequestContext, param: AppealParam) -> Result<Appeal> {
        debug!(review_id = param.review_id, store_id = param.store_id, "create_appeal");

        let review = self.get_review(ctx, param.review_id).await?;
        if review.store_id != param.store_id {
            return Err(ReviewError::AppealForbidden {
                review_id: param.review_id,
                store_id: param.store_id,
            });
        }

        let existing = ctx
            .guard(self.store.find_appeal(param.review_id, param.store_id))
            .await?;
        if existing.as_ref().is_some_and(|a| a.status.is_finalized()) {
            return Err(ReviewError::AppealAlreadyFinalized {
                review_id: param.review_id,
            });
        }

        let appeal_id = match &existing {
            Some(appeal) => appeal.appeal_id,
            None => self.ids.next_id(),
        };
        let appeal = Appeal::pending(
            appeal_id,
            param.review_id,
            param.store_id,
            param.reason,
            param.content,
            param.media,
        );

        // Zero rows: finalized between our read and the write
        if !ctx.guard(self.store.upsert_appeal(&appeal)).await? {
            return Err(ReviewError::AppealAlreadyFinalized {
                review_id: param.review_id,
            });
        }

        // A concurrent first appeal may have won the insert; return what is stored
        ctx.guard(self.store.find_appeal(param.review_id, param.store_id))
            .await?
            .ok_or(ReviewError::ReviewNotFound {
                review_id: param.review_id,
            })
    }

    /// Finalize an appeal; approval hides the review in the same transaction
    pub async fn audit_appeal(&self, ctx: &RequestContext, param: AuditAppealParam) -> Result<()> {
        debug!(
            appeal_id = param.appeal_id,
            review_id = param.review_id,
            status = ?param.status,
            "audit_appeal"
        );

        let AuditAppealParam {
            appeal_id,
            review_id,
            status,
            op_user,
        } = param;

        let result = ctx
            .guard(self.store.transaction(move |tx| -> Result<()> {
                if tx.update_appeal_status(appeal_id, review_id, status, &op_user)? == 0 {
                    return Err(ReviewError::AppealNotFound {
                        appeal_id,
                        review_id,
                    });
                }
                if status == AppealStatus::Approved
                    && tx.update_review_status(review_id, ReviewStatus::Hidden)? == 0
                {
                    return Err(ReviewError::ReviewNotFound { review_id });
                }
                Ok(())
            }))
            .await;

        if let Err(e) = &result {
            error!(appeal_id, review_id, "audit_appeal rolled back: {}", e);
        }
        result
    }

    pub async fn get_appeal(
        &self,
        ctx: &RequestContext,
        review_id: i64,
        store_id: i64,
    ) -> Result<Option<Appeal>> {
        debug!(review_id, store_id, "get_appeal");
        ctx.guard(self.store.find_appeal(review_id, store_id)).await
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Replies
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub async fn create_reply(&self, ctx: &RequestContext, param: ReplyParam) -> Result<Reply> {
        debug!(review_id = param.review_id, store_id = param.store_id, "create_reply");

        let review = self.get_review(ctx, param.review_id).await?;
        if review.has_reply {
            return Err(ReviewError::ReplyAlreadyExists {
                review_id: param.review_id,
            });
        }
        if review.store_id != param.store_id {
            return Err(ReviewError::ReplyForbidden {
                review_id: param.review_id,
                store_id: param.store_id,
            });
        }

        let reply = Reply::new(
            self.ids.next_id(),
            param.review_id,
            param.store_id,
            param.content,
            param.media,
        );
        let row = reply.clone();
        let review_id = reply.review_id;

        let result = ctx
            .guard(self.store.transaction(move |tx| -> Result<()> {
                let already = ReviewError::ReplyAlreadyExists { review_id };
                tx.insert_reply(&row).map_err(|e| {
                    if e.is_conflict() {
                        already.clone()
                    } else {
                        e.into()
                    }
                })?;
                if tx.mark_replied(review_id)? == 0 {
                    return Err(already);
                }
                Ok(())
            }))
            .await;

        match result {
            Ok(()) => Ok(reply),
            Err(e) => {
                error!(review_id, "create_reply rolled back: {}", e);
                Err(e)
            }
        }
    }

    pub async fn get_reply(&self, ctx: &RequestContext, review_id: i64) -> Result<Option<Reply>> {
        debug!(review_id, "get_reply");
        ctx.guard(self.store.get_reply(review_id)).await
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Listings
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// A user's reviews, newest first, straight from the row store
    pub async fn list_by_user(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Review>> {
        let (offset, limit) = self.paging.normalize(page, size);
        debug!(user_id, offset, limit, "list_by_user");

        ctx.guard(self.store.reviews_by_user(user_id, offset, limit))
            .await
    }

    /// A store's reviews through the listing cache
    ///
    /// Documents that do not decode into a review are skipped.
    pub async fn list_by_store(
        &self,
        ctx: &RequestContext,
        store_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Review>> {
        let (offset, limit) = self.paging.normalize(page, size);
        debug!(store_id, offset, limit, "list_by_store");

        let views = self.listing.list_by_store(ctx, store_id, offset, limit).await?;
        let mut reviews = Vec::with_capacity(views.len());
        for view in views {
            let review_id = view.review_id.clone();
            match view.into_review() {
                Ok(review) => reviews.push(review),
                Err(e) => warn!(review_id = %review_id, "Skipping review document: {}", e),
            }
        }
        Ok(reviews)
    }
}
