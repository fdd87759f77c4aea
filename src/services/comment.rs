//! Comments on videos. Anyone who can see a video may comment; only the author edits.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::require_content;
use super::video::visible_video;
use crate::domain::{CommentId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::{
    Comment, CommentRepository, DbPool, NewComment, SqlxCommentRepository, SqlxVideoRepository,
    VideoRepository,
};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    videos: Arc<dyn VideoRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, videos: Arc<dyn VideoRepository>) -> Self {
        Self { comments, videos }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlxCommentRepository::new(pool.clone())),
            Arc::new(SqlxVideoRepository::new(pool)),
        )
    }

    /// Comments on a video, newest first
    #[instrument(skip(self), fields(viewer = %viewer, video_id = %video_id))]
    pub async fn list_for_video(&self, viewer: &UserId, video_id: &VideoId) -> Result<Vec<Comment>> {
        visible_video(self.videos.as_ref(), viewer, video_id).await?;
        self.comments.list_by_video(video_id).await
    }

    #[instrument(skip(self, content), fields(owner = %owner, video_id = %video_id))]
    pub async fn add(&self, owner: &UserId, video_id: &VideoId, content: &str) -> Result<Comment> {
        let content = require_content(content)?;
        visible_video(self.videos.as_ref(), owner, video_id).await?;

        let comment = self
            .comments
            .create_comment(NewComment {
                id: CommentId::new(),
                video: video_id.clone(),
                owner: owner.clone(),
                content: content.to_string(),
            })
            .await?;
        info!(comment_id = %comment.id, "comment added");
        Ok(comment)
    }

    #[instrument(skip(self, content), fields(requester = %requester, comment_id = %comment_id))]
    pub async fn update(&self, requester: &UserId, comment_id: &CommentId, content: &str) -> Result<Comment> {
        let content = require_content(content)?;
        self.owned(requester, comment_id).await?;
        self.comments.update_content(comment_id, content).await
    }

    #[instrument(skip(self), fields(requester = %requester, comment_id = %comment_id))]
    pub async fn delete(&self, requester: &UserId, comment_id: &CommentId) -> Result<()> {
        self.owned(requester, comment_id).await?;
        self.comments.delete_comment(comment_id).await?;
        info!("comment deleted");
        Ok(())
    }

    async fn owned(&self, requester: &UserId, comment_id: &CommentId) -> Result<Comment> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| Error::not_found("Comment", comment_id.as_str()))?;

        if &comment.owner != requester {
            warn!(owner = %comment.owner, "comment modification by non-author refused");
            return Err(Error::forbidden("You are not authorized to modify this comment"));
        }
        Ok(comment)
    }
}
