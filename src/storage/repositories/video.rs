//! Videos, their view counter and per-viewer watch history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::blob::UploadedAsset;
use crate::domain::{PlaylistId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

const VIDEO_COLUMNS: &str = "v.id, v.video_file, v.video_public_id, v.thumbnail, v.thumbnail_public_id, \
                             v.title, v.description, v.duration, v.views, v.is_published, v.owner_id, \
                             v.created_at, v.updated_at";

#[derive(Debug, Clone, FromRow)]
struct VideoRow {
    pub id: String,
    pub video_file: String,
    pub video_public_id: String,
    pub thumbnail: String,
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: VideoId::from_string(row.id),
            video_file: row.video_file,
            video_public_id: row.video_public_id,
            thumbnail: row.thumbnail,
            thumbnail_public_id: row.thumbnail_public_id,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            is_published: row.is_published,
            owner: UserId::from_string(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub video_file: String,
    #[serde(skip)]
    pub video_public_id: String,
    pub thumbnail: String,
    #[serde(skip)]
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    /// Seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Unpublished videos are only visible to their owner
    pub fn visible_to(&self, viewer: &UserId) -> bool {
        self.is_published || &self.owner == viewer
    }
}

/// Location of a stored asset in the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
}

impl From<UploadedAsset> for StoredMedia {
    fn from(asset: UploadedAsset) -> Self {
        Self { url: asset.url, public_id: asset.public_id }
    }
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: VideoId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub video_file: StoredMedia,
    pub thumbnail: StoredMedia,
    pub duration: f64,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<StoredMedia>,
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, video: NewVideo) -> Result<Video>;

    async fn get_video(&self, id: &VideoId) -> Result<Option<Video>>;

    /// Published videos, newest first, optionally restricted to one owner
    async fn list_published(&self, owner: Option<&UserId>) -> Result<Vec<Video>>;

    /// Every video `owner` uploaded, published or not, newest first
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Video>>;

    async fn update_details(&self, id: &VideoId, changes: &VideoChanges) -> Result<Video>;

    /// Flip the published flag and return the updated video
    async fn toggle_published(&self, id: &VideoId) -> Result<Video>;

    async fn delete_video(&self, id: &VideoId) -> Result<()>;

    /// Count one view and move the video to the top of the viewer's history
    async fn record_view(&self, id: &VideoId, viewer: &UserId) -> Result<()>;

    /// Videos `viewer` watched, most recent first
    async fn watch_history(&self, viewer: &UserId) -> Result<Vec<Video>>;

    /// Videos `user` liked, most recent like first
    async fn liked_by(&self, user: &UserId) -> Result<Vec<Video>>;

    /// Videos of a playlist in the order they were added
    async fn list_in_playlist(&self, playlist: &PlaylistId, viewer: &UserId) -> Result<Vec<Video>>;
}

#[derive(Debug, Clone)]
pub struct SqlxVideoRepository {
    pool: DbPool,
}

impl SqlxVideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, sql: &str, first: &str, context: &str) -> Result<Vec<Video>> {
        let rows = sqlx::query_as::<_, VideoRow>(sql)
            .bind(first)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, context))?;

        Ok(rows.into_iter().map(Video::from).collect())
    }

    async fn require_video(&self, id: &VideoId) -> Result<Video> {
        self.get_video(id).await?.ok_or_else(|| Error::not_found("Video", id.as_str()))
    }
}

#[async_trait]
impl VideoRepository for SqlxVideoRepository {
    #[instrument(skip(self, video), fields(video_id = %video.id, owner = %video.owner), name = "db_create_video")]
    async fn create_video(&self, video: NewVideo) -> Result<Video> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO videos (id, video_file, video_public_id, thumbnail, thumbnail_public_id, title, description,
                                duration, views, is_published, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 1, $9, $10, $11)
            "#,
        )
        .bind(&video.id)
        .bind(&video.video_file.url)
        .bind(&video.video_file.public_id)
        .bind(&video.thumbnail.url)
        .bind(&video.thumbnail.public_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(&video.owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to create video"))?;

        self.get_video(&video.id)
            .await?
            .ok_or_else(|| Error::internal("Video not found after creation"))
    }

    #[instrument(skip(self), fields(video_id = %id), name = "db_get_video")]
    async fn get_video(&self, id: &VideoId) -> Result<Option<Video>> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos v WHERE v.id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch video"))?;

        Ok(row.map(Video::from))
    }

    #[instrument(skip(self), name = "db_list_published_videos")]
    async fn list_published(&self, owner: Option<&UserId>) -> Result<Vec<Video>> {
        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos v \
             WHERE v.is_published = 1 AND ($1 IS NULL OR v.owner_id = $1) \
             ORDER BY v.created_at DESC, v.rowid DESC",
            VIDEO_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list videos"))?;

        Ok(rows.into_iter().map(Video::from).collect())
    }

    #[instrument(skip(self), fields(owner = %owner), name = "db_list_videos_by_owner")]
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Video>> {
        self.fetch_all(
            &format!(
                "SELECT {} FROM videos v WHERE v.owner_id = $1 ORDER BY v.created_at DESC, v.rowid DESC",
                VIDEO_COLUMNS
            ),
            owner.as_str(),
            "Failed to list channel videos",
        )
        .await
    }

    #[instrument(skip(self, changes), fields(video_id = %id), name = "db_update_video")]
    async fn update_details(&self, id: &VideoId, changes: &VideoChanges) -> Result<Video> {
        let thumbnail = changes.thumbnail.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                thumbnail = COALESCE($3, thumbnail),
                thumbnail_public_id = COALESCE($4, thumbnail_public_id),
                updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(thumbnail.map(|t| t.url.as_str()))
        .bind(thumbnail.map(|t| t.public_id.as_str()))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to update video"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Video", id.as_str()));
        }

        self.require_video(id).await
    }

    #[instrument(skip(self), fields(video_id = %id), name = "db_toggle_video_published")]
    async fn toggle_published(&self, id: &VideoId) -> Result<Video> {
        let result = sqlx::query(
            "UPDATE videos SET is_published = NOT is_published, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to toggle publish status"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Video", id.as_str()));
        }

        self.require_video(id).await
    }

    #[instrument(skip(self), fields(video_id = %id), name = "db_delete_video")]
    async fn delete_video(&self, id: &VideoId) -> Result<()> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to delete video"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Video", id.as_str()));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(video_id = %id, viewer = %viewer), name = "db_record_video_view")]
    async fn record_view(&self, id: &VideoId, viewer: &UserId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| Error::database(err, "Failed to begin view transaction"))?;

        let result = sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to count video view"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Video", id.as_str()));
        }

        sqlx::query(
            r#"
            INSERT INTO watch_history (user_id, video_id, watched_at) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at
            "#,
        )
        .bind(viewer)
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|err| Error::database(err, "Failed to record watch history"))?;

        tx.commit().await.map_err(|err| Error::database(err, "Failed to commit video view"))
    }

    #[instrument(skip(self), fields(viewer = %viewer), name = "db_watch_history")]
    async fn watch_history(&self, viewer: &UserId) -> Result<Vec<Video>> {
        self.fetch_all(
            &format!(
                "SELECT {} FROM watch_history h JOIN videos v ON v.id = h.video_id \
                 WHERE h.user_id = $1 AND (v.is_published = 1 OR v.owner_id = $1) \
                 ORDER BY h.watched_at DESC",
                VIDEO_COLUMNS
            ),
            viewer.as_str(),
            "Failed to load watch history",
        )
        .await
    }

    #[instrument(skip(self), fields(user = %user), name = "db_liked_videos")]
    async fn liked_by(&self, user: &UserId) -> Result<Vec<Video>> {
        self.fetch_all(
            &format!(
                "SELECT {} FROM likes l JOIN videos v ON v.id = l.video_id \
                 WHERE l.liked_by = $1 AND (v.is_published = 1 OR v.owner_id = $1) \
                 ORDER BY l.created_at DESC, l.rowid DESC",
                VIDEO_COLUMNS
            ),
            user.as_str(),
            "Failed to list liked videos",
        )
        .await
    }

    #[instrument(skip(self), fields(playlist_id = %playlist), name = "db_list_playlist_videos")]
    async fn list_in_playlist(&self, playlist: &PlaylistId, viewer: &UserId) -> Result<Vec<Video>> {
        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM playlist_videos pv JOIN videos v ON v.id = pv.video_id \
             WHERE pv.playlist_id = $1 AND (v.is_published = 1 OR v.owner_id = $2) \
             ORDER BY pv.added_at, pv.rowid",
            VIDEO_COLUMNS
        ))
        .bind(playlist)
        .bind(viewer)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list playlist videos"))?;

        Ok(rows.into_iter().map(Video::from).collect())
    }
}
