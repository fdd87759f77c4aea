//! # Storage and Persistence
//!
//! SQLite connectivity, embedded migrations and the repositories for accounts,
//! tweets, videos, comments, likes, subscriptions and playlists.

pub mod pool;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use crate::config::DatabaseConfig;

pub use pool::{create_pool, get_pool_stats, DbPool, PoolStats};
pub use repositories::{
    ChannelProfile, Comment, CommentRepository, Like, LikeRepository, LikeTarget, NewComment,
    NewPlaylist, NewTweet, NewVideo, Playlist, PlaylistRepository, SqlxCommentRepository,
    SqlxLikeRepository, SqlxPlaylistRepository, SqlxSubscriptionRepository, SqlxTweetRepository,
    SqlxUserRepository, SqlxVideoRepository, StoredMedia, Subscription, SubscriptionRepository,
    Tweet, TweetRepository, UserCredentials, UserRepository, Video, VideoChanges, VideoRepository,
};

use crate::errors::{Error, Result};

/// Apply the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::database(e, "Database connectivity check failed"))?;

    Ok(())
}
