//! Playlists: owner-curated, publicly readable lists of videos.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::non_blank;
use super::video::visible_video;
use crate::domain::{PlaylistId, UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::{
    DbPool, NewPlaylist, Playlist, PlaylistRepository, SqlxPlaylistRepository, SqlxVideoRepository,
    Video, VideoRepository,
};

/// A playlist with the videos the viewer is allowed to see, in playlist order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetails {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<Video>,
}

#[derive(Clone)]
pub struct PlaylistService {
    playlists: Arc<dyn PlaylistRepository>,
    videos: Arc<dyn VideoRepository>,
}

impl PlaylistService {
    pub fn new(playlists: Arc<dyn PlaylistRepository>, videos: Arc<dyn VideoRepository>) -> Self {
        Self { playlists, videos }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlxPlaylistRepository::new(pool.clone())),
            Arc::new(SqlxVideoRepository::new(pool)),
        )
    }

    #[instrument(skip(self, name, description), fields(owner = %owner))]
    pub async fn create(&self, owner: &UserId, name: &str, description: &str) -> Result<PlaylistDetails> {
        for (value, field) in [(name, "name"), (description, "description")] {
            if value.trim().is_empty() {
                return Err(Error::validation_field("Name and description are required", field));
            }
        }

        let playlist = self
            .playlists
            .create_playlist(NewPlaylist {
                id: PlaylistId::new(),
                owner: owner.clone(),
                name: name.trim().to_string(),
                description: description.trim().to_string(),
            })
            .await?;
        info!(playlist_id = %playlist.id, "playlist created");
        Ok(PlaylistDetails { playlist, videos: Vec::new() })
    }

    #[instrument(skip(self), fields(viewer = %viewer, playlist_id = %id))]
    pub async fn get(&self, viewer: &UserId, id: &PlaylistId) -> Result<PlaylistDetails> {
        let playlist = self.require(id).await?;
        self.with_videos(viewer, playlist).await
    }

    /// Playlists owned by `user_id`, newest first
    #[instrument(skip(self), fields(viewer = %viewer, user_id = %user_id))]
    pub async fn list_for_user(&self, viewer: &UserId, user_id: &UserId) -> Result<Vec<PlaylistDetails>> {
        let mut details = Vec::new();
        for playlist in self.playlists.list_by_owner(user_id).await? {
            details.push(self.with_videos(viewer, playlist).await?);
        }
        Ok(details)
    }

    #[instrument(skip(self, name, description), fields(requester = %requester, playlist_id = %id))]
    pub async fn update(
        &self,
        requester: &UserId,
        id: &PlaylistId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<PlaylistDetails> {
        let name = non_blank(name);
        let description = non_blank(description);
        if name.is_none() && description.is_none() {
            return Err(Error::validation("Name or description is required"));
        }

        self.owned(requester, id).await?;
        let playlist =
            self.playlists.update_details(id, name.as_deref(), description.as_deref()).await?;
        self.with_videos(requester, playlist).await
    }

    #[instrument(skip(self), fields(requester = %requester, playlist_id = %id))]
    pub async fn delete(&self, requester: &UserId, id: &PlaylistId) -> Result<()> {
        self.owned(requester, id).await?;
        self.playlists.delete_playlist(id).await?;
        info!("playlist deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(requester = %requester, playlist_id = %id, video_id = %video_id))]
    pub async fn add_video(
        &self,
        requester: &UserId,
        id: &PlaylistId,
        video_id: &VideoId,
    ) -> Result<PlaylistDetails> {
        self.owned(requester, id).await?;
        visible_video(self.videos.as_ref(), requester, video_id).await?;

        if !self.playlists.add_video(id, video_id).await? {
            return Err(Error::validation_field("Video already added to the playlist", "videoId"));
        }
        self.get(requester, id).await
    }

    #[instrument(skip(self), fields(requester = %requester, playlist_id = %id, video_id = %video_id))]
    pub async fn remove_video(
        &self,
        requester: &UserId,
        id: &PlaylistId,
        video_id: &VideoId,
    ) -> Result<PlaylistDetails> {
        self.owned(requester, id).await?;

        if !self.playlists.remove_video(id, video_id).await? {
            return Err(Error::validation_field("Video is not in the playlist", "videoId"));
        }
        self.get(requester, id).await
    }

    async fn with_videos(&self, viewer: &UserId, playlist: Playlist) -> Result<PlaylistDetails> {
        let videos = self.videos.list_in_playlist(&playlist.id, viewer).await?;
        Ok(PlaylistDetails { playlist, videos })
    }

    async fn require(&self, id: &PlaylistId) -> Result<Playlist> {
        self.playlists.get_playlist(id).await?.ok_or_else(|| Error::not_found("Playlist", id.as_str()))
    }

    async fn owned(&self, requester: &UserId, id: &PlaylistId) -> Result<Playlist> {
        let playlist = self.require(id).await?;
        if &playlist.owner != requester {
            warn!(owner = %playlist.owner, "playlist modification by non-owner refused");
            return Err(Error::forbidden("You are not authorized to modify this playlist"));
        }
        Ok(playlist)
    }
}
