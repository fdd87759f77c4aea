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
use crate::domain::{CommentId, VideoId};
use crate::storage::Comment;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub content: String,
}

pub async fn list_video_comments_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Vec<Comment>>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let comments = state.comments.list_for_video(&user.id, &video_id).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

pub async fn add_comment_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    let body = json_body(payload)?;
    let comment = state.comments.add(&user.id, &video_id, &body.content).await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

pub async fn update_comment_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment_id = parse_id::<CommentId>(&comment_id, "comment")?;
    let body = json_body(payload)?;
    let comment = state.comments.update(&user.id, &comment_id, &body.content).await?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

pub async fn delete_comment_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let comment_id = parse_id::<CommentId>(&comment_id, "comment")?;
    state.comments.delete(&user.id, &comment_id).await?;
    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
