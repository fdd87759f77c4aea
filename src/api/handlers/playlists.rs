use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, parse_id};
use crate::api::error::ApiError;
use crate::api::{ApiResponse, ApiState};
use crate::auth::CurrentUser;
use crate::domain::{PlaylistId, UserId, VideoId};
use crate::services::PlaylistDetails;

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_playlist_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<PlaylistBody>, JsonRejection>,
) -> Result<ApiResponse<PlaylistDetails>, ApiError> {
    let body = json_body(payload)?;
    let playlist = state
        .playlists
        .create(
            &user.id,
            body.name.as_deref().unwrap_or_default(),
            body.description.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

pub async fn my_playlists_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<PlaylistDetails>>, ApiError> {
    let playlists = state.playlists.list_for_user(&user.id, &user.id).await?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

pub async fn user_playlists_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistDetails>>, ApiError> {
    let user_id = parse_id::<UserId>(&user_id, "user")?;
    let playlists = state.playlists.list_for_user(&user.id, &user_id).await?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

pub async fn get_playlist_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistDetails>, ApiError> {
    let playlist_id = parse_id::<PlaylistId>(&playlist_id, "playlist")?;
    let playlist = state.playlists.get(&user.id, &playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

pub async fn update_playlist_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
    payload: Result<Json<PlaylistBody>, JsonRejection>,
) -> Result<ApiResponse<PlaylistDetails>, ApiError> {
    let playlist_id = parse_id::<PlaylistId>(&playlist_id, "playlist")?;
    let body = json_body(payload)?;
    let playlist = state
        .playlists
        .update(&user.id, &playlist_id, body.name.as_deref(), body.description.as_deref())
        .await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

pub async fn delete_playlist_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let playlist_id = parse_id::<PlaylistId>(&playlist_id, "playlist")?;
    state.playlists.delete(&user.id, &playlist_id).await?;
    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

pub async fn add_playlist_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistDetails>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let playlist_id = parse_id::<PlaylistId>(&playlist_id, "playlist")?;
    let playlist = state.playlists.add_video(&user.id, &playlist_id, &video_id).await?;
    Ok(ApiResponse::ok(playlist, "Video added to the playlist successfully"))
}

pub async fn remove_playlist_video_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistDetails>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let playlist_id = parse_id::<PlaylistId>(&playlist_id, "playlist")?;
    let playlist = state.playlists.remove_video(&user.id, &playlist_id, &video_id).await?;
    Ok(ApiResponse::ok(playlist, "Video removed from the playlist successfully"))
}
