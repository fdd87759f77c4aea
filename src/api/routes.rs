use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{
    middleware::{authenticate, SessionAuthenticator},
    SessionService, TokenIssuer, TokenKeys,
};
use crate::blob::BlobStore;
use crate::config::{Config, Environment};
use crate::services::{
    AccountService, CommentService, LikeService, PlaylistService, SubscriptionService,
    TweetService, VideoService,
};
use crate::storage::{DbPool, SqlxSubscriptionRepository, SqlxUserRepository, UserRepository};

use super::handlers::{
    add_comment_handler, add_playlist_video_handler, change_password_handler,
    channel_profile_handler, channel_subscribers_handler, channel_videos_handler,
    create_playlist_handler, create_tweet_handler, current_user_handler, delete_comment_handler,
    delete_playlist_handler, delete_tweet_handler, delete_video_handler, get_playlist_handler,
    get_video_handler, healthcheck_handler, list_user_tweets_handler, list_video_comments_handler,
    list_videos_handler, liked_videos_handler, login_handler, logout_handler,
    my_playlists_handler, publish_video_handler, refresh_token_handler, register_handler,
    remove_playlist_video_handler, subscribed_channels_handler, toggle_comment_like_handler,
    toggle_publish_handler, toggle_subscription_handler, toggle_tweet_like_handler,
    toggle_video_like_handler, update_account_handler, update_avatar_handler,
    update_comment_handler, update_cover_image_handler, update_playlist_handler,
    update_tweet_handler, update_video_handler, user_playlists_handler, watch_history_handler,
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MAX_VIDEO_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Attributes applied to the session cookies
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
}

#[derive(Clone)]
pub struct ApiState {
    pub pool: DbPool,
    pub sessions: SessionService,
    pub accounts: AccountService,
    pub tweets: TweetService,
    pub videos: VideoService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub subscriptions: SubscriptionService,
    pub playlists: PlaylistService,
    pub authenticator: Arc<SessionAuthenticator>,
    pub cookies: CookiePolicy,
    pub upload_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub max_body_size: usize,
}

impl ApiState {
    pub fn new(pool: DbPool, config: &Config, blobs: Arc<dyn BlobStore>) -> Self {
        let keys = TokenKeys::from(&config.auth);
        let cookies = CookiePolicy {
            secure: config.environment != Environment::Development,
            access_max_age: keys.access_ttl,
            refresh_max_age: keys.refresh_ttl,
        };
        let issuer = Arc::new(TokenIssuer::new(keys));
        let users: Arc<dyn UserRepository> = Arc::new(SqlxUserRepository::new(pool.clone()));

        Self {
            sessions: SessionService::new(users.clone(), issuer.clone()),
            accounts: AccountService::new(users.clone(), blobs.clone()),
            tweets: TweetService::with_sqlx(pool.clone()),
            videos: VideoService::with_sqlx(pool.clone(), blobs),
            comments: CommentService::with_sqlx(pool.clone()),
            likes: LikeService::with_sqlx(pool.clone()),
            subscriptions: SubscriptionService::new(
                Arc::new(SqlxSubscriptionRepository::new(pool.clone())),
                users.clone(),
            ),
            playlists: PlaylistService::with_sqlx(pool.clone()),
            authenticator: Arc::new(SessionAuthenticator::new(issuer, users)),
            cookies,
            upload_dir: config.blob_store.temp_dir.clone(),
            cors_origin: config.api.cors_origin.clone(),
            max_body_size: config.api.max_body_size,
            pool,
        }
    }
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        ),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}

pub fn build_router(state: ApiState) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.authenticator.clone(), authenticate);
    let upload_limit = DefaultBodyLimit::max(MAX_UPLOAD_BYTES);
    let video_upload_limit = DefaultBodyLimit::max(MAX_VIDEO_UPLOAD_BYTES);

    let public_api = Router::new()
        .route("/api/v1/healthcheck", get(healthcheck_handler))
        .route("/api/v1/users/register", post(register_handler).layer(upload_limit))
        .route("/api/v1/users/login", post(login_handler))
        .route("/api/v1/users/refresh-token", post(refresh_token_handler));

    let secured_api = Router::new()
        .route("/api/v1/users/logout", post(logout_handler))
        .route("/api/v1/users/change-password", post(change_password_handler))
        .route("/api/v1/users/current-user", get(current_user_handler).post(current_user_handler))
        .route("/api/v1/users/update-account", post(update_account_handler))
        .route("/api/v1/users/avatar", patch(update_avatar_handler).layer(upload_limit))
        .route("/api/v1/users/cover-image", patch(update_cover_image_handler).layer(upload_limit))
        .route("/api/v1/tweets", post(create_tweet_handler))
        .route("/api/v1/tweets/user/{user_id}", get(list_user_tweets_handler))
        .route("/api/v1/tweets/{tweet_id}", patch(update_tweet_handler).delete(delete_tweet_handler))
        .route("/api/v1/users/c/{username}", get(channel_profile_handler))
        .route("/api/v1/users/history", get(watch_history_handler))
        .route(
            "/api/v1/videos",
            get(list_videos_handler).post(publish_video_handler).layer(video_upload_limit),
        )
        .route(
            "/api/v1/videos/{video_id}",
            get(get_video_handler)
                .patch(update_video_handler)
                .delete(delete_video_handler)
                .layer(upload_limit),
        )
        .route("/api/v1/videos/toggle/publish/{video_id}", patch(toggle_publish_handler))
        .route(
            "/api/v1/comments/{video_id}",
            get(list_video_comments_handler).post(add_comment_handler),
        )
        .route(
            "/api/v1/comments/c/{comment_id}",
            patch(update_comment_handler).delete(delete_comment_handler),
        )
        .route("/api/v1/like/toggle/v/{video_id}", post(toggle_video_like_handler))
        .route("/api/v1/like/toggle/c/{comment_id}", post(toggle_comment_like_handler))
        .route("/api/v1/like/toggle/t/{tweet_id}", post(toggle_tweet_like_handler))
        .route("/api/v1/like/videos", get(liked_videos_handler))
        .route(
            "/api/v1/subscription/c/{channel_id}",
            get(channel_subscribers_handler).post(toggle_subscription_handler),
        )
        .route("/api/v1/subscription/u/{subscriber_id}", get(subscribed_channels_handler))
        .route("/api/v1/playlists", get(my_playlists_handler).post(create_playlist_handler))
        .route(
            "/api/v1/playlists/{playlist_id}",
            get(get_playlist_handler).patch(update_playlist_handler).delete(delete_playlist_handler),
        )
        .route("/api/v1/playlists/user/{user_id}", get(user_playlists_handler))
        .route("/api/v1/playlists/add/{video_id}/{playlist_id}", patch(add_playlist_video_handler))
        .route(
            "/api/v1/playlists/remove/{video_id}/{playlist_id}",
            patch(remove_playlist_video_handler),
        )
        .route("/api/v1/dashboard/videos", get(channel_videos_handler))
        .route_layer(auth_layer);

    let cors = state.cors_origin.as_deref().and_then(cors_layer);
    let body_limit = DefaultBodyLimit::max(state.max_body_size);

    let router = public_api
        .merge(secured_api)
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            crate::request_span!(request.method(), request.uri().path())
        }));

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}
