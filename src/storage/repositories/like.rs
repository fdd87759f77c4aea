//! Likes on videos, comments and tweets. One like per (target, user).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::{CommentId, LikeId, TweetId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

/// What a like points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Video(VideoId),
    Comment(CommentId),
    Tweet(TweetId),
}

impl LikeTarget {
    fn column(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video_id",
            LikeTarget::Comment(_) => "comment_id",
            LikeTarget::Tweet(_) => "tweet_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LikeTarget::Video(id) => id.as_str(),
            LikeTarget::Comment(id) => id.as_str(),
            LikeTarget::Tweet(id) => id.as_str(),
        }
    }

    /// Resource name used in messages and errors
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "Video",
            LikeTarget::Comment(_) => "Comment",
            LikeTarget::Tweet(_) => "Tweet",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct LikeRow {
    pub id: String,
    pub video_id: Option<String>,
    pub comment_id: Option<String>,
    pub tweet_id: Option<String>,
    pub liked_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Like {
            id: LikeId::from_string(row.id),
            video: row.video_id.map(VideoId::from_string),
            comment: row.comment_id.map(CommentId::from_string),
            tweet: row.tweet_id.map(TweetId::from_string),
            liked_by: UserId::from_string(row.liked_by),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: LikeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<TweetId>,
    pub liked_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Remove the user's like on `target` if present, otherwise add one.
    ///
    /// Returns the new like, or `None` when an existing like was removed.
    async fn toggle(&self, target: &LikeTarget, user: &UserId) -> Result<Option<Like>>;

    async fn count(&self, target: &LikeTarget) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxLikeRepository {
    pool: DbPool,
}

impl SqlxLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for SqlxLikeRepository {
    #[instrument(skip(self), fields(target = target.kind(), target_id = target.id(), user = %user), name = "db_toggle_like")]
    async fn toggle(&self, target: &LikeTarget, user: &UserId) -> Result<Option<Like>> {
        let column = target.column();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| Error::database(err, "Failed to begin like transaction"))?;

        let removed = sqlx::query(&format!("DELETE FROM likes WHERE {} = $1 AND liked_by = $2", column))
            .bind(target.id())
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to remove like"))?;

        if removed.rows_affected() > 0 {
            tx.commit().await.map_err(|err| Error::database(err, "Failed to commit like removal"))?;
            return Ok(None);
        }

        let id = LikeId::new();
        let row = sqlx::query_as::<_, LikeRow>(&format!(
            "INSERT INTO likes (id, {}, liked_by, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, video_id, comment_id, tweet_id, liked_by, created_at",
            column
        ))
        .bind(&id)
        .bind(target.id())
        .bind(user)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| Error::database(err, "Failed to add like"))?;

        tx.commit().await.map_err(|err| Error::database(err, "Failed to commit like"))?;
        Ok(Some(Like::from(row)))
    }

    #[instrument(skip(self), fields(target = target.kind(), target_id = target.id()), name = "db_count_likes")]
    async fn count(&self, target: &LikeTarget) -> Result<i64> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM likes WHERE {} = $1", target.column()))
            .bind(target.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to count likes"))
    }
}
