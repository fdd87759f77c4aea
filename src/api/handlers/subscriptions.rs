use axum::extract::{Path, State};

use super::parse_id;
use crate::api::error::ApiError;
use crate::api::{ApiResponse, ApiState};
use crate::auth::{CurrentUser, User};
use crate::domain::UserId;
use crate::storage::{ChannelProfile, Subscription};

/// 201 with the subscription when subscribing, 200 with null data when unsubscribing.
pub async fn toggle_subscription_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Option<Subscription>>, ApiError> {
    let channel_id = parse_id::<UserId>(&channel_id, "channel")?;
    Ok(match state.subscriptions.toggle(&user.id, &channel_id).await? {
        Some(subscription) => ApiResponse::created(Some(subscription), "Subscribed to channel"),
        None => ApiResponse::ok(None, "Unsubscribed from channel"),
    })
}

pub async fn channel_subscribers_handler(
    State(state): State<ApiState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let channel_id = parse_id::<UserId>(&channel_id, "channel")?;
    let subscribers = state.subscriptions.subscribers(&channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

pub async fn subscribed_channels_handler(
    State(state): State<ApiState>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let subscriber_id = parse_id::<UserId>(&subscriber_id, "subscriber")?;
    let channels = state.subscriptions.subscribed_channels(&subscriber_id).await?;
    Ok(ApiResponse::ok(channels, "Subscribed channels fetched successfully"))
}

pub async fn channel_profile_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, ApiError> {
    let profile = state.subscriptions.channel_profile(&user.id, &username).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}
