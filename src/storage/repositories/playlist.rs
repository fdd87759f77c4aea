//! Playlists and their ordered video membership.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::{PlaylistId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlaylistRow> for Playlist {
    fn from(row: PlaylistRow) -> Self {
        Playlist {
            id: PlaylistId::from_string(row.id),
            name: row.name,
            description: row.description,
            owner: UserId::from_string(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub id: PlaylistId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist>;

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Playlists owned by `owner`, newest first
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Playlist>>;

    /// Rename or redescribe; `None` keeps the stored value
    async fn update_details(
        &self,
        id: &PlaylistId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist>;

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()>;

    /// Append a video. Returns `false` if it was already in the playlist.
    async fn add_video(&self, id: &PlaylistId, video: &VideoId) -> Result<bool>;

    /// Returns `false` if the video was not in the playlist.
    async fn remove_video(&self, id: &PlaylistId, video: &VideoId) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct SqlxPlaylistRepository {
    pool: DbPool,
}

impl SqlxPlaylistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn touch(&self, id: &PlaylistId) -> Result<()> {
        sqlx::query("UPDATE playlists SET updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to touch playlist"))?;
        Ok(())
    }
}

#[async_trait]
impl PlaylistRepository for SqlxPlaylistRepository {
    #[instrument(skip(self, playlist), fields(playlist_id = %playlist.id, owner = %playlist.owner), name = "db_create_playlist")]
    async fn create_playlist(&self, playlist: NewPlaylist) -> Result<Playlist> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO playlists (id, name, description, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to create playlist"))?;

        self.get_playlist(&playlist.id)
            .await?
            .ok_or_else(|| Error::internal("Playlist not found after creation"))
    }

    #[instrument(skip(self), fields(playlist_id = %id), name = "db_get_playlist")]
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            "SELECT id, name, description, owner_id, created_at, updated_at FROM playlists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch playlist"))?;

        Ok(row.map(Playlist::from))
    }

    #[instrument(skip(self), fields(owner = %owner), name = "db_list_playlists_by_owner")]
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Playlist>> {
        let rows = sqlx::query_as::<_, PlaylistRow>(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM playlists
            WHERE owner_id = $1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list playlists"))?;

        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    #[instrument(skip(self, name, description), fields(playlist_id = %id), name = "db_update_playlist")]
    async fn update_details(
        &self,
        id: &PlaylistId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist> {
        let result = sqlx::query(
            "UPDATE playlists SET name = COALESCE($1, name), description = COALESCE($2, description), \
             updated_at = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to update playlist"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Playlist", id.as_str()));
        }

        self.get_playlist(id).await?.ok_or_else(|| Error::not_found("Playlist", id.as_str()))
    }

    #[instrument(skip(self), fields(playlist_id = %id), name = "db_delete_playlist")]
    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to delete playlist"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Playlist", id.as_str()));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(playlist_id = %id, video_id = %video), name = "db_add_playlist_video")]
    async fn add_video(&self, id: &PlaylistId, video: &VideoId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id, added_at) VALUES ($1, $2, $3) \
             ON CONFLICT (playlist_id, video_id) DO NOTHING",
        )
        .bind(id)
        .bind(video)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to add video to playlist"))?;

        let added = result.rows_affected() == 1;
        if added {
            self.touch(id).await?;
        }
        Ok(added)
    }

    #[instrument(skip(self), fields(playlist_id = %id, video_id = %video), name = "db_remove_playlist_video")]
    async fn remove_video(&self, id: &PlaylistId, video: &VideoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(id)
            .bind(video)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to remove video from playlist"))?;

        let removed = result.rows_affected() == 1;
        if removed {
            self.touch(id).await?;
        }
        Ok(removed)
    }
}
