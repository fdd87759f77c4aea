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
use crate::domain::{TweetId, UserId};
use crate::storage::Tweet;

#[derive(Debug, Deserialize)]
pub struct TweetBody {
    #[serde(default)]
    pub content: String,
}

pub async fn create_tweet_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<TweetBody>, JsonRejection>,
) -> Result<ApiResponse<Tweet>, ApiError> {
    let body = json_body(payload)?;
    let tweet = state.tweets.create(&user.id, &body.content).await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

pub async fn list_user_tweets_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<Tweet>>, ApiError> {
    let user_id = parse_id::<UserId>(&user_id, "user")?;
    let tweets = state.tweets.list_for_user(&user.id, &user_id).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

pub async fn update_tweet_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
    payload: Result<Json<TweetBody>, JsonRejection>,
) -> Result<ApiResponse<Tweet>, ApiError> {
    let tweet_id = parse_id::<TweetId>(&tweet_id, "tweet")?;
    let body = json_body(payload)?;
    let tweet = state.tweets.update(&user.id, &tweet_id, &body.content).await?;
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

pub async fn delete_tweet_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let tweet_id = parse_id::<TweetId>(&tweet_id, "tweet")?;
    state.tweets.delete(&user.id, &tweet_id).await?;
    Ok(ApiResponse::ok(json!({}), "Tweet deleted successfully"))
}
