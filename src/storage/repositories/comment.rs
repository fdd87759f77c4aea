//! Comments left on videos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::{CommentId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct CommentRow {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::from_string(row.id),
            content: row.content,
            video: VideoId::from_string(row.video_id),
            owner: UserId::from_string(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub video: VideoId,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: CommentId,
    pub video: VideoId,
    pub owner: UserId,
    pub content: String,
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    async fn get_comment(&self, id: &CommentId) -> Result<Option<Comment>>;

    /// Comments on `video`, newest first
    async fn list_by_video(&self, video: &VideoId) -> Result<Vec<Comment>>;

    async fn update_content(&self, id: &CommentId, content: &str) -> Result<Comment>;

    async fn delete_comment(&self, id: &CommentId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxCommentRepository {
    pool: DbPool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    #[instrument(skip(self, comment), fields(comment_id = %comment.id, video_id = %comment.video), name = "db_create_comment")]
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO comments (id, content, video_id, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.video)
        .bind(&comment.owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to create comment"))?;

        self.get_comment(&comment.id)
            .await?
            .ok_or_else(|| Error::internal("Comment not found after creation"))
    }

    #[instrument(skip(self), fields(comment_id = %id), name = "db_get_comment")]
    async fn get_comment(&self, id: &CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, content, video_id, owner_id, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch comment"))?;

        Ok(row.map(Comment::from))
    }

    #[instrument(skip(self), fields(video_id = %video), name = "db_list_comments_by_video")]
    async fn list_by_video(&self, video: &VideoId) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, content, video_id, owner_id, created_at, updated_at
            FROM comments
            WHERE video_id = $1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(video)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list comments"))?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    #[instrument(skip(self, content), fields(comment_id = %id), name = "db_update_comment")]
    async fn update_content(&self, id: &CommentId, content: &str) -> Result<Comment> {
        let result = sqlx::query("UPDATE comments SET content = $1, updated_at = $2 WHERE id = $3")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to update comment"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Comment", id.as_str()));
        }

        self.get_comment(id).await?.ok_or_else(|| Error::not_found("Comment", id.as_str()))
    }

    #[instrument(skip(self), fields(comment_id = %id), name = "db_delete_comment")]
    async fn delete_comment(&self, id: &CommentId) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to delete comment"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Comment", id.as_str()));
        }

        Ok(())
    }
}
