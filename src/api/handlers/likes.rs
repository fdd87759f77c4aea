use axum::extract::{Path, State};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::{ApiResponse, ApiState};
use crate::auth::CurrentUser;
use crate::domain::{CommentId, TweetId, UserId, VideoId};
use crate::storage::{Like, LikeTarget, Video};

/// `data` is the new like, or null when an existing like was removed
async fn toggle(
    state: &ApiState,
    user: &UserId,
    target: LikeTarget,
) -> Result<ApiResponse<Option<Like>>, ApiError> {
    let liked_message = format!("{} liked", target.kind());
    let outcome = state.likes.toggle(user, target).await?;
    let message = if outcome.liked() { liked_message } else { "Like removed".to_string() };
    Ok(ApiResponse::ok(outcome.like, message))
}

pub async fn toggle_video_like_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Option<Like>>, ApiError> {
    let video_id = parse_id::<VideoId>(&video_id, "video")?;
    toggle(&state, &user.id, LikeTarget::Video(video_id)).await
}

pub async fn toggle_comment_like_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Option<Like>>, ApiError> {
    let comment_id = parse_id::<CommentId>(&comment_id, "comment")?;
    toggle(&state, &user.id, LikeTarget::Comment(comment_id)).await
}

pub async fn toggle_tweet_like_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Option<Like>>, ApiError> {
    let tweet_id = parse_id::<TweetId>(&tweet_id, "tweet")?;
    toggle(&state, &user.id, LikeTarget::Tweet(tweet_id)).await
}

pub async fn liked_videos_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Video>>, ApiError> {
    let videos = state.likes.liked_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
