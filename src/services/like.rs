//! Like toggling on videos, comments and tweets.

use std::sync::Arc;

use tracing::{info, instrument};

use super::video::visible_video;
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::{
    CommentRepository, DbPool, Like, LikeRepository, LikeTarget, SqlxCommentRepository,
    SqlxLikeRepository, SqlxTweetRepository, SqlxVideoRepository, TweetRepository, Video,
    VideoRepository,
};

/// Outcome of a toggle: the new like, or `None` when a like was removed
#[derive(Debug, Clone, PartialEq)]
pub struct LikeToggle {
    pub like: Option<Like>,
}

impl LikeToggle {
    pub fn liked(&self) -> bool {
        self.like.is_some()
    }
}

#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    videos: Arc<dyn VideoRepository>,
    comments: Arc<dyn CommentRepository>,
    tweets: Arc<dyn TweetRepository>,
}

impl LikeService {
    pub fn new(
        likes: Arc<dyn LikeRepository>,
        videos: Arc<dyn VideoRepository>,
        comments: Arc<dyn CommentRepository>,
        tweets: Arc<dyn TweetRepository>,
    ) -> Self {
        Self { likes, videos, comments, tweets }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlxLikeRepository::new(pool.clone())),
            Arc::new(SqlxVideoRepository::new(pool.clone())),
            Arc::new(SqlxCommentRepository::new(pool.clone())),
            Arc::new(SqlxTweetRepository::new(pool)),
        )
    }

    /// Like the target, or remove the user's existing like on it
    #[instrument(skip(self), fields(user = %user, target = target.kind(), target_id = target.id()))]
    pub async fn toggle(&self, user: &UserId, target: LikeTarget) -> Result<LikeToggle> {
        self.require_target(user, &target).await?;
        let like = self.likes.toggle(&target, user).await?;
        info!(liked = like.is_some(), "like toggled");
        Ok(LikeToggle { like })
    }

    /// Videos the user liked, most recent like first
    #[instrument(skip(self), fields(user = %user))]
    pub async fn liked_videos(&self, user: &UserId) -> Result<Vec<Video>> {
        self.videos.liked_by(user).await
    }

    async fn require_target(&self, user: &UserId, target: &LikeTarget) -> Result<()> {
        let exists = match target {
            LikeTarget::Video(id) => {
                visible_video(self.videos.as_ref(), user, id).await?;
                true
            }
            LikeTarget::Comment(id) => self.comments.get_comment(id).await?.is_some(),
            LikeTarget::Tweet(id) => self.tweets.get_tweet(id).await?.is_some(),
        };
        if !exists {
            return Err(Error::not_found(target.kind(), target.id()));
        }
        Ok(())
    }
}
