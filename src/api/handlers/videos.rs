use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, parse_id};
use crate::api::error::ApiError;
use crate::api::upload::stage_multipart;
use crate::api::{ApiResponse, ApiState};
use crate::auth::CurrentUser;
use crate::domain::{UserId, VideoId};
use crate::services::{PublishVideo, UpdateVideo};
use crate::storage::Video;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoDetailsBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Published videos, newest first. `?userId=` restricts the list to one channel.
pub async fn list_videos_handler(
    State(state): State<ApiState>,
    Query(query): Query<VideoListQuery>,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let owner = match query.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(raw) => Some(parse_id::<UserId>(raw, "user")?),
        None => None,
    };
    let videos = state.videos.list(owner.as_ref()).await?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

pub async fn publish_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<Video>, ApiError> {
    let mut form = stage_multipart(multipart, &state.upload_dir).await?;

    let input = PublishVideo {
        title: form.text("title"),
        description: form.text("description"),
        video_path: form.take_file("videoFile"),
        thumbnail_path: form.take_file("thumbnail"),
    };
    form.discard_remaining().await;

    let video = state.videos.publish(&user.id, input).await?;
    Ok(ApiResponse::created(video, "Video published successfully"))
}

pub async fn get_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let video = state.videos.get(&user.id, &video_id).await?;
    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// Accepts a multipart form (with an optional `thumbnail` file) or a JSON body.
pub async fn update_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    request: Request,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;

    let input = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        let mut form = stage_multipart(multipart, &state.upload_dir).await?;
        let input = UpdateVideo {
            title: form.fields.get("title").cloned(),
            description: form.fields.get("description").cloned(),
            thumbnail_path: form.take_file("thumbnail"),
        };
        form.discard_remaining().await;
        input
    } else {
        let payload: Result<Json<VideoDetailsBody>, JsonRejection> =
            Json::from_request(request, &state).await;
        let body = json_body(payload)?;
        UpdateVideo { title: body.title, description: body.description, thumbnail_path: None }
    };

    let video = state.videos.update(&user.id, &video_id, input).await?;
    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

pub async fn delete_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    state.videos.delete(&user.id, &video_id).await?;
    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

pub async fn toggle_publish_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let video = state.videos.toggle_publish(&user.id, &video_id).await?;
    let message =
        if video.is_published { "Video is now published" } else { "Video is now unpublished" };
    Ok(ApiResponse::ok(video, message))
}

/// Every video the current user uploaded, including unpublished ones
pub async fn channel_videos_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let videos = state.videos.channel_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos, "Videos retrieved successfully"))
}

pub async fn watch_history_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let videos = state.videos.watch_history(&user.id).await?;
    Ok(ApiResponse::ok(videos, "Watch history fetched successfully"))
}
