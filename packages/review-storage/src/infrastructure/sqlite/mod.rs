//! SQLite Review Store
//!
//! Row store gateway over a single SQLite connection. Suitable for local
//! development and testing (`in_memory`), and for single-node deployments
//! (`open`).
//!
//! Uniqueness backing the domain invariants:
//! - `review_info.order_id`: one review per order
//! - `review_reply_info.review_id`: one reply per review
//! - `review_appeal_info.review_id`: one appeal lifeline per review

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::domain::models::{Appeal, AppealStatus, Media, Reply, Review, ReviewStatus};
use crate::domain::ports::{ReviewAudit, ReviewStore, ReviewTx};
use crate::error::{ErrorKind, Result, StorageError};

const REVIEW_COLUMNS: &str = "id, review_id, order_id, user_id, store_id, sku_id, spu_id, \
     score, service_score, express_score, content, pic_info, video_info, anonymous, status, \
     is_default, has_reply, op_user, op_reason, op_remarks, created_at, updated_at";

const REPLY_COLUMNS: &str =
    "reply_id, review_id, store_id, content, pic_info, video_info, created_at";

const APPEAL_COLUMNS: &str = "appeal_id, review_id, store_id, status, reason, content, \
     pic_info, video_info, op_user, created_at, updated_at";

/// SQLite-based ReviewStore implementation
#[derive(Clone)]
pub struct SqliteReviewStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReviewStore {
    /// Open (or create) a database file
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Run administrative SQL (migrations, fixtures, triggers)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS review_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                review_id INTEGER NOT NULL UNIQUE,
                order_id INTEGER NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                store_id INTEGER NOT NULL,
                sku_id INTEGER NOT NULL DEFAULT 0,
                spu_id INTEGER NOT NULL DEFAULT 0,
                score INTEGER NOT NULL DEFAULT 0,
                service_score INTEGER NOT NULL DEFAULT 0,
                express_score INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL DEFAULT '',
                pic_info TEXT NOT NULL DEFAULT '[]',
                video_info TEXT NOT NULL DEFAULT '[]',
                has_media INTEGER NOT NULL DEFAULT 0,
                anonymous INTEGER NOT NULL DEFAULT 0,
                status INTEGER NOT NULL DEFAULT 10,
                is_default INTEGER NOT NULL DEFAULT 0,
                has_reply INTEGER NOT NULL DEFAULT 0,
                op_user TEXT NOT NULL DEFAULT '',
                op_reason TEXT NOT NULL DEFAULT '',
                op_remarks TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_review_user ON review_info(user_id);
            CREATE INDEX IF NOT EXISTS idx_review_store ON review_info(store_id);

            CREATE TABLE IF NOT EXISTS review_reply_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reply_id INTEGER NOT NULL UNIQUE,
                review_id INTEGER NOT NULL UNIQUE,
                store_id INTEGER NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                pic_info TEXT NOT NULL DEFAULT '[]',
                video_info TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS review_appeal_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                appeal_id INTEGER NOT NULL UNIQUE,
                review_id INTEGER NOT NULL UNIQUE,
                store_id INTEGER NOT NULL,
                status INTEGER NOT NULL DEFAULT 10,
                reason TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                pic_info TEXT NOT NULL DEFAULT '[]',
                video_info TEXT NOT NULL DEFAULT '[]',
                op_user TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_appeal_review_store
                ON review_appeal_info(review_id, store_id);",
        )?;

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Row mapping
// ═══════════════════════════════════════════════════════════════════════════

fn encode_media_list(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

fn decode_media_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn review_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<ReviewStatus> {
    let code: i32 = row.get(idx)?;
    ReviewStatus::from_code(code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code as i64))
}

fn appeal_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<AppealStatus> {
    let code: i32 = row.get(idx)?;
    AppealStatus::from_code(code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code as i64))
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        review_id: row.get(1)?,
        order_id: row.get(2)?,
        user_id: row.get(3)?,
        store_id: row.get(4)?,
        sku_id: row.get(5)?,
        spu_id: row.get(6)?,
        score: row.get(7)?,
        service_score: row.get(8)?,
        express_score: row.get(9)?,
        content: row.get(10)?,
        media: Media::new(decode_media_list(row, 11)?, decode_media_list(row, 12)?),
        anonymous: row.get(13)?,
        status: review_status(row, 14)?,
        is_default: row.get(15)?,
        has_reply: row.get(16)?,
        op_user: row.get(17)?,
        op_reason: row.get(18)?,
        op_remarks: row.get(19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        reply_id: row.get(0)?,
        review_id: row.get(1)?,
        store_id: row.get(2)?,
        content: row.get(3)?,
        media: Media::new(decode_media_list(row, 4)?, decode_media_list(row, 5)?),
        created_at: row.get(6)?,
    })
}

fn appeal_from_row(row: &Row<'_>) -> rusqlite::Result<Appeal> {
    Ok(Appeal {
        appeal_id: row.get(0)?,
        review_id: row.get(1)?,
        store_id: row.get(2)?,
        status: appeal_status(row, 3)?,
        reason: row.get(4)?,
        content: row.get(5)?,
        media: Media::new(decode_media_list(row, 6)?, decode_media_list(row, 7)?),
        op_user: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements shared by the store and its transactions
// ═══════════════════════════════════════════════════════════════════════════

fn select_review(conn: &Connection, review_id: i64) -> Result<Option<Review>> {
    let sql = format!("SELECT {} FROM review_info WHERE review_id = ?1", REVIEW_COLUMNS);
    Ok(conn
        .query_row(&sql, params![review_id], review_from_row)
        .optional()?)
}

fn update_status(conn: &Connection, review_id: i64, status: ReviewStatus) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE review_info SET status = ?1, updated_at = ?2 WHERE review_id = ?3",
        params![status.code(), Utc::now(), review_id],
    )?)
}

fn set_has_reply(conn: &Connection, review_id: i64) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE review_info SET has_reply = 1, updated_at = ?1
         WHERE review_id = ?2 AND has_reply = 0",
        params![Utc::now(), review_id],
    )?)
}

/// Keeps `Conflict` only for a uniqueness failure on `key`; a clash on any
/// other unique column (e.g. a generated id) is a backend failure
fn conflict_on(key: &'static str) -> impl FnOnce(rusqlite::Error) -> StorageError {
    move |err| {
        let on_key = err.to_string().contains(key);
        let mut err = StorageError::from(err);
        if err.is_conflict() && !on_key {
            err.kind = ErrorKind::Database;
        }
        err
    }
}

fn insert_reply_row(conn: &Connection, reply: &Reply) -> Result<()> {
    let sql = format!(
        "INSERT INTO review_reply_info ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        REPLY_COLUMNS
    );
    conn.execute(
        &sql,
        params![
            reply.reply_id,
            reply.review_id,
            reply.store_id,
            &reply.content,
            encode_media_list(&reply.media.pictures)?,
            encode_media_list(&reply.media.videos)?,
            reply.created_at,
        ],
    )
    .map_err(conflict_on("review_reply_info.review_id"))?;
    Ok(())
}

fn update_appeal(
    conn: &Connection,
    appeal_id: i64,
    review_id: i64,
    status: AppealStatus,
    op_user: &str,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE review_appeal_info SET status = ?1, op_user = ?2, updated_at = ?3
         WHERE appeal_id = ?4 AND review_id = ?5",
        params![status.code(), op_user, Utc::now(), appeal_id, review_id],
    )?)
}

/// Transaction scope handed to `ReviewStore::transaction` callers
struct SqliteTx<'t> {
    conn: &'t Connection,
}

impl ReviewTx for SqliteTx<'_> {
    fn get_review(&mut self, review_id: i64) -> Result<Option<Review>> {
        select_review(self.conn, review_id)
    }

    fn update_review_status(&mut self, review_id: i64, status: ReviewStatus) -> Result<usize> {
        update_status(self.conn, review_id, status)
    }

    fn mark_replied(&mut self, review_id: i64) -> Result<usize> {
        set_has_reply(self.conn, review_id)
    }

    fn insert_reply(&mut self, reply: &Reply) -> Result<()> {
        insert_reply_row(self.conn, reply)
    }

    fn update_appeal_status(
        &mut self,
        appeal_id: i64,
        review_id: i64,
        status: AppealStatus,
        op_user: &str,
    ) -> Result<usize> {
        update_appeal(self.conn, appeal_id, review_id, status, op_user)
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn insert_review(&self, review: &Review) -> Result<Review> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO review_info (review_id, order_id, user_id, store_id, sku_id, spu_id,
                score, service_score, express_score, content, pic_info, video_info, has_media,
                anonymous, status, is_default, has_reply, op_user, op_reason, op_remarks,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                review.review_id,
                review.order_id,
                review.user_id,
                review.store_id,
                review.sku_id,
                review.spu_id,
                review.score,
                review.service_score,
                review.express_score,
                &review.content,
                encode_media_list(&review.media.pictures)?,
                encode_media_list(&review.media.videos)?,
                review.has_media(),
                review.anonymous,
                review.status.code(),
                review.is_default,
                review.has_reply,
                &review.op_user,
                &review.op_reason,
                &review.op_remarks,
                review.created_at,
                review.updated_at,
            ],
        )
        .map_err(conflict_on("review_info.order_id"))?;

        let mut saved = review.clone();
        saved.id = conn.last_insert_rowid();
        Ok(saved)
    }

    async fn get_review(&self, review_id: i64) -> Result<Option<Review>> {
        let conn = self.conn.lock();
        select_review(&conn, review_id)
    }

    async fn reviews_by_order(&self, order_id: i64) -> Result<Vec<Review>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM review_info WHERE order_id = ?1", REVIEW_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let reviews = stmt
            .query_map(params![order_id], review_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    async fn reviews_by_user(
        &self,
        user_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Review>> {
        // An offset SQLite cannot represent is past every row
        let Ok(offset) = i64::try_from(offset) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM review_info WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            REVIEW_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reviews = stmt
            .query_map(params![user_id, limit, offset], review_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    async fn update_review_audit(&self, audit: &ReviewAudit) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(conn.execute(
            "UPDATE review_info
             SET status = ?1, op_user = ?2, op_reason = ?3, op_remarks = ?4, updated_at = ?5
             WHERE review_id = ?6",
            params![
                audit.status.code(),
                &audit.op_user,
                &audit.op_reason,
                &audit.op_remarks,
                Utc::now(),
                audit.review_id,
            ],
        )?)
    }

    async fn get_reply(&self, review_id: i64) -> Result<Option<Reply>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM review_reply_info WHERE review_id = ?1",
            REPLY_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![review_id], reply_from_row)
            .optional()?)
    }

    async fn find_appeal(&self, review_id: i64, store_id: i64) -> Result<Option<Appeal>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM review_appeal_info WHERE review_id = ?1 AND store_id = ?2",
            APPEAL_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![review_id, store_id], appeal_from_row)
            .optional()?)
    }

    async fn upsert_appeal(&self, appeal: &Appeal) -> Result<bool> {
        let conn = self.conn.lock();
        let sql = format!(
            "INSERT INTO review_appeal_info ({})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(review_id) DO UPDATE SET
                status = excluded.status,
                reason = excluded.reason,
                content = excluded.content,
                pic_info = excluded.pic_info,
                video_info = excluded.video_info,
                updated_at = excluded.updated_at
             WHERE review_appeal_info.status <= 10
               AND review_appeal_info.store_id = excluded.store_id",
            APPEAL_COLUMNS
        );
        let changed = conn.execute(
            &sql,
            params![
                appeal.appeal_id,
                appeal.review_id,
                appeal.store_id,
                appeal.status.code(),
                &appeal.reason,
                &appeal.content,
                encode_media_list(&appeal.media.pictures)?,
                encode_media_list(&appeal.media.videos)?,
                &appeal.op_user,
                appeal.created_at,
                appeal.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    async fn transaction<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn ReviewTx) -> std::result::Result<T, E> + Send,
        T: Send,
        E: From<StorageError> + Send,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(StorageError::from)?;

        match work(&mut SqliteTx { conn: &tx }) {
            Ok(value) => {
                tx.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(review_id: i64, order_id: i64, user_id: i64, store_id: i64) -> Review {
        let mut r = Review::new(review_id, order_id, user_id, store_id);
        r.content = format!("review {}", review_id);
        r.media = Media::new(vec!["p.jpg".into()], vec!["v.mp4".into()]);
        r
    }

    #[tokio::test]
    async fn test_insert_and_get_review() {
        let store = SqliteReviewStore::in_memory().unwrap();
        let saved = store.insert_review(&review(1, 100, 7, 3)).await.unwrap();
        assert!(saved.id > 0);

        let loaded = store.get_review(1).await.unwrap().unwrap();
        assert_eq!(loaded.order_id, 100);
        assert_eq!(loaded.media.pictures, vec!["p.jpg".to_string()]);
        assert_eq!(loaded.status, ReviewStatus::PendingAudit);
        assert!(store.get_review(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");

        {
            let store = SqliteReviewStore::open(&path).unwrap();
            store.insert_review(&review(1, 100, 7, 3)).await.unwrap();
        }

        let reopened = SqliteReviewStore::open(&path).unwrap();
        let loaded = reopened.get_review(1).await.unwrap().unwrap();
        assert_eq!(loaded.content, "review 1");
    }

    #[tokio::test]
    async fn test_duplicate_order_is_conflict() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        let err = store.insert_review(&review(2, 100, 7, 3)).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.reviews_by_order(100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_review_id_is_not_an_order_conflict() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        let err = store.insert_review(&review(1, 101, 7, 3)).await.unwrap_err();
        assert!(!err.is_conflict());
        assert!(store.reviews_by_order(101).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_trigger_abort_is_not_conflict() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TRIGGER refuse_review BEFORE INSERT ON review_info
                 BEGIN SELECT RAISE(ABORT, 'disk policy'); END;",
            )
            .unwrap();

        let err = store.insert_review(&review(1, 100, 7, 3)).await.unwrap_err();
        assert!(!err.is_conflict());
        assert_eq!(err.kind, ErrorKind::Database);
    }

    #[tokio::test]
    async fn test_reviews_by_user_newest_first() {
        let store = SqliteReviewStore::in_memory().unwrap();
        for i in 1..=5 {
            store.insert_review(&review(i, 100 + i, 7, 3)).await.unwrap();
        }
        store.insert_review(&review(99, 999, 8, 3)).await.unwrap();

        let page = store.reviews_by_user(7, 0, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![5, 4]);

        let page = store.reviews_by_user(7, 4, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_reviews_by_user_offset_past_i64_is_empty() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        assert!(store.reviews_by_user(7, usize::MAX, 10).await.unwrap().is_empty());
        assert!(store
            .reviews_by_user(7, i64::MAX as usize + 1, 10)
            .await
            .unwrap()
            .is_empty());

        let page = store.reviews_by_user(7, 0, usize::MAX).await.unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_update_review_audit() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        let changed = store
            .update_review_audit(&ReviewAudit {
                review_id: 1,
                status: ReviewStatus::Rejected,
                op_user: "op-1".into(),
                op_reason: "spam".into(),
                op_remarks: "links".into(),
            })
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let loaded = store.get_review(1).await.unwrap().unwrap();
        assert_eq!(loaded.status, ReviewStatus::Rejected);
        assert_eq!(loaded.op_reason, "spam");
    }

    #[tokio::test]
    async fn test_upsert_appeal_updates_pending_in_place() {
        let store = SqliteReviewStore::in_memory().unwrap();
        let first = Appeal::pending(500, 1, 3, "fake", "first", Media::default());
        assert!(store.upsert_appeal(&first).await.unwrap());

        let second = Appeal::pending(500, 1, 3, "fake", "second", Media::default());
        assert!(store.upsert_appeal(&second).await.unwrap());

        let loaded = store.find_appeal(1, 3).await.unwrap().unwrap();
        assert_eq!(loaded.appeal_id, 500);
        assert_eq!(loaded.content, "second");
    }

    #[tokio::test]
    async fn test_upsert_appeal_skips_finalized() {
        let store = SqliteReviewStore::in_memory().unwrap();
        let appeal = Appeal::pending(500, 1, 3, "fake", "first", Media::default());
        store.upsert_appeal(&appeal).await.unwrap();
        let finalized: std::result::Result<usize, StorageError> = store
            .transaction(|tx| tx.update_appeal_status(500, 1, AppealStatus::Rejected, "op"))
            .await;
        assert_eq!(finalized.unwrap(), 1);

        let retry = Appeal::pending(501, 1, 3, "fake", "again", Media::default());
        assert!(!store.upsert_appeal(&retry).await.unwrap());

        let loaded = store.find_appeal(1, 3).await.unwrap().unwrap();
        assert_eq!(loaded.status, AppealStatus::Rejected);
        assert_eq!(loaded.content, "first");
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        let result: std::result::Result<(), StorageError> = store
            .transaction(|tx| {
                tx.insert_reply(&Reply::new(900, 1, 3, "thanks", Media::default()))?;
                tx.mark_replied(1)?;
                Err(StorageError::transaction("abort"))
            })
            .await;
        assert!(result.is_err());

        assert!(store.get_reply(1).await.unwrap().is_none());
        assert!(!store.get_review(1).await.unwrap().unwrap().has_reply);
    }

    #[tokio::test]
    async fn test_mark_replied_is_conditional() {
        let store = SqliteReviewStore::in_memory().unwrap();
        store.insert_review(&review(1, 100, 7, 3)).await.unwrap();

        let counts: std::result::Result<(usize, usize), StorageError> = store
            .transaction(|tx| Ok((tx.mark_replied(1)?, tx.mark_replied(1)?)))
            .await;
        assert_eq!(counts.unwrap(), (1, 0));
    }
}
