use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::json_body;
use crate::api::error::ApiError;
use crate::api::routes::CookiePolicy;
use crate::api::upload::stage_multipart;
use crate::api::{ApiResponse, ApiState};
use crate::auth::{
    CurrentUser, LoginRequest, TokenPair, User, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::services::RegisterUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseBody {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenBody {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountBody {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
}

fn to_cookie_age(duration: std::time::Duration) -> time::Duration {
    time::Duration::seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
}

fn session_cookie(name: &'static str, value: String, policy: &CookiePolicy) -> Cookie<'static> {
    let max_age = if name == ACCESS_TOKEN_COOKIE {
        policy.access_max_age
    } else {
        policy.refresh_max_age
    };

    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(policy.secure)
        .same_site(SameSite::Strict)
        .max_age(to_cookie_age(max_age))
        .build()
}

fn expired_cookie(name: &'static str, policy: &CookiePolicy) -> Cookie<'static> {
    Cookie::build(name).path("/").http_only(true).secure(policy.secure).same_site(SameSite::Strict).build()
}

fn with_session_cookies(jar: CookieJar, tokens: &TokenPair, policy: &CookiePolicy) -> CookieJar {
    jar.add(session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone(), policy))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone(), policy))
}

pub async fn register_handler(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    let mut form = stage_multipart(multipart, &state.upload_dir).await?;

    let input = RegisterUser {
        fullname: form.text("fullname"),
        email: form.text("email"),
        username: form.text("username"),
        password: form.text("password"),
        avatar_path: form.take_file("avatar"),
        cover_path: form.take_file("coverImage"),
    };
    form.discard_remaining().await;

    let user = state.accounts.register(input).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

pub async fn login_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<LoginResponseBody>), ApiError> {
    let request = json_body(payload)?;
    let outcome = state.sessions.login(&request).await?;

    let jar = with_session_cookies(jar, &outcome.tokens, &state.cookies);
    let body = LoginResponseBody {
        user: outcome.user,
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    };
    Ok((jar, ApiResponse::ok(body, "User logged in successfully")))
}

pub async fn logout_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Value>), ApiError> {
    state.sessions.logout(&user.id).await?;

    let jar = jar
        .remove(expired_cookie(ACCESS_TOKEN_COOKIE, &state.cookies))
        .remove(expired_cookie(REFRESH_TOKEN_COOKIE, &state.cookies));
    Ok((jar, ApiResponse::ok(json!({}), "User logged out")))
}

/// Refresh from the `refreshToken` cookie, falling back to a JSON body field.
pub async fn refresh_token_handler(
    State(state): State<ApiState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<TokenPair>), ApiError> {
    let from_cookie = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty());

    let presented = match from_cookie {
        Some(token) => Some(token),
        None if body.iter().all(u8::is_ascii_whitespace) => None,
        None => {
            serde_json::from_slice::<RefreshTokenBody>(&body)
                .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?
                .refresh_token
        }
    };

    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    let jar = with_session_cookies(jar, &tokens, &state.cookies);
    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

pub async fn change_password_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChangePasswordBody>, JsonRejection>,
) -> Result<ApiResponse<Value>, ApiError> {
    let body = json_body(payload)?;
    state.sessions.change_password(&user.id, &body.old_password, &body.new_password).await?;
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn current_user_handler(CurrentUser(user): CurrentUser) -> ApiResponse<User> {
    ApiResponse::ok(user, "User fetched successfully")
}

pub async fn update_account_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateAccountBody>, JsonRejection>,
) -> Result<ApiResponse<User>, ApiError> {
    let body = json_body(payload)?;
    let updated = state.accounts.update_account(&user.id, &body.fullname, &body.email).await?;
    Ok(ApiResponse::ok(updated, "Account details updated successfully"))
}

pub async fn update_avatar_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    let mut form = stage_multipart(multipart, &state.upload_dir).await?;
    let path = form.take_file("avatar");
    form.discard_remaining().await;

    let updated = state.accounts.update_avatar(&user.id, path).await?;
    Ok(ApiResponse::ok(updated, "Avatar updated successfully"))
}

pub async fn update_cover_image_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    let mut form = stage_multipart(multipart, &state.upload_dir).await?;
    let path = form.take_file("coverImage");
    form.discard_remaining().await;

    let updated = state.accounts.update_cover_image(&user.id, path).await?;
    Ok(ApiResponse::ok(updated, "Cover image updated successfully"))
}
