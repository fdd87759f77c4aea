//! Video publishing, playback bookkeeping and owner-only management.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::non_blank;
use crate::blob::{discard_local_file, BlobStore, UploadedAsset};
use crate::domain::{UserId, VideoId};
use crate::errors::{Error, Result};
use crate::storage::{
    DbPool, NewVideo, SqlxVideoRepository, StoredMedia, Video, VideoChanges, VideoRepository,
};

/// Publish input. Files are already staged on local disk.
#[derive(Debug, Clone, Default)]
pub struct PublishVideo {
    pub title: String,
    pub description: String,
    pub video_path: Option<PathBuf>,
    pub thumbnail_path: Option<PathBuf>,
}

/// Details update. Blank text counts as not provided.
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_path: Option<PathBuf>,
}

/// Fetch a video `viewer` may see. Someone else's unpublished video reads as missing.
pub(crate) async fn visible_video(
    videos: &dyn VideoRepository,
    viewer: &UserId,
    id: &VideoId,
) -> Result<Video> {
    match videos.get_video(id).await? {
        Some(video) if video.visible_to(viewer) => Ok(video),
        _ => Err(Error::not_found("Video", id.as_str())),
    }
}

#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl VideoService {
    pub fn new(videos: Arc<dyn VideoRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { videos, blobs }
    }

    pub fn with_sqlx(pool: DbPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self::new(Arc::new(SqlxVideoRepository::new(pool)), blobs)
    }

    /// Upload the video file and thumbnail, then record the video.
    ///
    /// If the thumbnail upload or the insert fails, assets already uploaded are deleted.
    #[instrument(skip(self, input), fields(owner = %owner))]
    pub async fn publish(&self, owner: &UserId, input: PublishVideo) -> Result<Video> {
        let result = self.publish_staged(owner, &input).await;
        if result.is_err() {
            for path in input.video_path.iter().chain(input.thumbnail_path.iter()) {
                discard_local_file(path).await;
            }
        }
        result
    }

    async fn publish_staged(&self, owner: &UserId, input: &PublishVideo) -> Result<Video> {
        for (value, field) in [(&input.title, "title"), (&input.description, "description")] {
            if value.trim().is_empty() {
                return Err(Error::validation_field("All fields are required", field));
            }
        }
        let video_path = input
            .video_path
            .as_deref()
            .ok_or_else(|| Error::validation_field("Video file is required", "videoFile"))?;
        let thumbnail_path = input
            .thumbnail_path
            .as_deref()
            .ok_or_else(|| Error::validation_field("Thumbnail is required", "thumbnail"))?;

        let video_file = self
            .blobs
            .upload(video_path)
            .await
            .ok_or_else(|| Error::upstream("Video upload failed"))?;

        let Some(thumbnail) = self.blobs.upload(thumbnail_path).await else {
            warn!(public_id = %video_file.public_id, "thumbnail upload failed, removing uploaded video");
            self.blobs.delete_video(&video_file.public_id).await;
            return Err(Error::upstream("Thumbnail upload failed"));
        };

        let new_video = NewVideo {
            id: VideoId::new(),
            owner: owner.clone(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            duration: video_file.duration.unwrap_or_default(),
            video_file: StoredMedia::from(video_file.clone()),
            thumbnail: StoredMedia::from(thumbnail.clone()),
        };

        match self.videos.create_video(new_video).await {
            Ok(video) => {
                info!(video_id = %video.id, "video published");
                Ok(video)
            }
            Err(err) => {
                warn!(error = %err, "video insert failed, removing uploaded assets");
                self.compensate(&video_file, &thumbnail).await;
                Err(err)
            }
        }
    }

    async fn compensate(&self, video_file: &UploadedAsset, thumbnail: &UploadedAsset) {
        if self.blobs.delete_video(&video_file.public_id).await.is_none() {
            warn!(public_id = %video_file.public_id, "orphaned video asset");
        }
        if self.blobs.delete(&thumbnail.public_id).await.is_none() {
            warn!(public_id = %thumbnail.public_id, "orphaned thumbnail asset");
        }
    }

    /// Published videos, newest first, optionally for a single owner
    #[instrument(skip(self))]
    pub async fn list(&self, owner: Option<&UserId>) -> Result<Vec<Video>> {
        self.videos.list_published(owner).await
    }

    /// Fetch a video for playback, counting the view and recording it in the viewer's history.
    #[instrument(skip(self), fields(viewer = %viewer, video_id = %id))]
    pub async fn get(&self, viewer: &UserId, id: &VideoId) -> Result<Video> {
        visible_video(self.videos.as_ref(), viewer, id).await?;
        self.videos.record_view(id, viewer).await?;
        self.videos.get_video(id).await?.ok_or_else(|| Error::not_found("Video", id.as_str()))
    }

    #[instrument(skip(self, input), fields(requester = %requester, video_id = %id))]
    pub async fn update(&self, requester: &UserId, id: &VideoId, input: UpdateVideo) -> Result<Video> {
        let result = self.update_staged(requester, id, &input).await;
        if result.is_err() {
            if let Some(path) = &input.thumbnail_path {
                discard_local_file(path).await;
            }
        }
        result
    }

    async fn update_staged(&self, requester: &UserId, id: &VideoId, input: &UpdateVideo) -> Result<Video> {
        let title = non_blank(input.title.as_deref());
        let description = non_blank(input.description.as_deref());
        if title.is_none() && description.is_none() && input.thumbnail_path.is_none() {
            return Err(Error::validation("Title, description or thumbnail is required"));
        }

        let current = self.owned(requester, id).await?;

        let thumbnail = match input.thumbnail_path.as_deref() {
            Some(path) => Some(
                self.blobs
                    .upload(path)
                    .await
                    .ok_or_else(|| Error::upstream("Thumbnail upload failed"))?,
            ),
            None => None,
        };

        let changes = VideoChanges {
            title,
            description,
            thumbnail: thumbnail.clone().map(StoredMedia::from),
        };

        match self.videos.update_details(id, &changes).await {
            Ok(video) => {
                if thumbnail.is_some() && self.blobs.delete(&current.thumbnail_public_id).await.is_none() {
                    warn!(public_id = %current.thumbnail_public_id, "previous thumbnail was not deleted");
                }
                Ok(video)
            }
            Err(err) => {
                if let Some(asset) = thumbnail {
                    self.blobs.delete(&asset.public_id).await;
                }
                Err(err)
            }
        }
    }

    /// Delete the video and then its hosted assets
    #[instrument(skip(self), fields(requester = %requester, video_id = %id))]
    pub async fn delete(&self, requester: &UserId, id: &VideoId) -> Result<()> {
        let video = self.owned(requester, id).await?;
        self.videos.delete_video(id).await?;
        info!("video deleted");

        if self.blobs.delete_video(&video.video_public_id).await.is_none() {
            warn!(public_id = %video.video_public_id, "orphaned video asset");
        }
        if self.blobs.delete(&video.thumbnail_public_id).await.is_none() {
            warn!(public_id = %video.thumbnail_public_id, "orphaned thumbnail asset");
        }
        Ok(())
    }

    #[instrument(skip(self), fields(requester = %requester, video_id = %id))]
    pub async fn toggle_publish(&self, requester: &UserId, id: &VideoId) -> Result<Video> {
        self.owned(requester, id).await?;
        let video = self.videos.toggle_published(id).await?;
        info!(is_published = video.is_published, "publish status toggled");
        Ok(video)
    }

    /// Every video the user uploaded, including unpublished ones
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn channel_videos(&self, owner: &UserId) -> Result<Vec<Video>> {
        self.videos.list_by_owner(owner).await
    }

    #[instrument(skip(self), fields(viewer = %viewer))]
    pub async fn watch_history(&self, viewer: &UserId) -> Result<Vec<Video>> {
        self.videos.watch_history(viewer).await
    }

    async fn owned(&self, requester: &UserId, id: &VideoId) -> Result<Video> {
        let video = visible_video(self.videos.as_ref(), requester, id).await?;
        if &video.owner != requester {
            warn!(owner = %video.owner, "video modification by non-owner refused");
            return Err(Error::forbidden("You are not authorized to modify this video"));
        }
        Ok(video)
    }
}
