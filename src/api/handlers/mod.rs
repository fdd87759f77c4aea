//! HTTP request handlers organized by resource type

pub mod comments;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

pub use comments::{
    add_comment_handler, delete_comment_handler, list_video_comments_handler,
    update_comment_handler,
};
pub use healthcheck::healthcheck_handler;
pub use likes::{
    liked_videos_handler, toggle_comment_like_handler, toggle_tweet_like_handler,
    toggle_video_like_handler,
};
pub use playlists::{
    add_playlist_video_handler, create_playlist_handler, delete_playlist_handler,
    get_playlist_handler, my_playlists_handler, remove_playlist_video_handler,
    update_playlist_handler, user_playlists_handler,
};
pub use subscriptions::{
    channel_profile_handler, channel_subscribers_handler, subscribed_channels_handler,
    toggle_subscription_handler,
};
pub use tweets::{
    create_tweet_handler, delete_tweet_handler, list_user_tweets_handler, update_tweet_handler,
};
pub use users::{
    change_password_handler, current_user_handler, login_handler, logout_handler,
    refresh_token_handler, register_handler, update_account_handler, update_avatar_handler,
    update_cover_image_handler,
};
pub use videos::{
    channel_videos_handler, delete_video_handler, get_video_handler, list_videos_handler,
    publish_video_handler, toggle_publish_handler, update_video_handler, watch_history_handler,
};

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::api::error::ApiError;

/// Unwrap a JSON body, reporting rejections in the error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Parse a path id; malformed values are a 400 naming the kind of id.
pub(crate) fn parse_id<T: FromStr>(raw: &str, kind: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request(format!("Invalid {} id", kind)))
}
