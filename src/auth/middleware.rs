//! Axum middleware that resolves the session credential to an account.
//!
//! The `accessToken` cookie is checked first, then `Authorization: Bearer`.
//! On success the account is attached to the request as [`CurrentUser`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{field, info_span, warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::token_issuer::TokenIssuer;
use crate::auth::user::User;
use crate::auth::ACCESS_TOKEN_COOKIE;
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::UserRepository;

/// The authenticated account for this request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))
    }
}

/// Verifies access tokens and loads the account they name. Read-only against the store.
#[derive(Clone)]
pub struct SessionAuthenticator {
    issuer: Arc<TokenIssuer>,
    users: Arc<dyn UserRepository>,
}

pub type AuthenticatorState = Arc<SessionAuthenticator>;

impl SessionAuthenticator {
    pub fn new(issuer: Arc<TokenIssuer>, users: Arc<dyn UserRepository>) -> Self {
        Self { issuer, users }
    }

    /// Resolve a raw access token to an account
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::auth("Unauthorized request", AuthErrorType::MissingToken))?;

        let user_id = self.issuer.verify_access(token)?;

        self.users
            .get_user(&user_id)
            .await?
            .ok_or_else(|| Error::invalid_token("Token subject no longer exists"))
    }
}

/// Pick the transport credential: cookie first, then bearer header.
pub fn extract_access_token<'a>(jar: &'a CookieJar, headers: &'a HeaderMap) -> Option<&'a str> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value_trimmed();
        if !value.is_empty() {
            return Some(value);
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware entry point that authenticates requests with the [`SessionAuthenticator`].
pub async fn authenticate(
    State(authenticator): State<AuthenticatorState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let correlation_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "auth_middleware.authenticate",
        http.method = %request.method(),
        http.path = %request.uri().path(),
        auth.user_id = field::Empty,
        correlation_id = %correlation_id
    );

    let token = extract_access_token(&jar, request.headers()).map(str::to_owned);

    match authenticator.authenticate(token.as_deref()).instrument(span.clone()).await {
        Ok(user) => {
            span.record("auth.user_id", field::display(&user.id));
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).instrument(span).await)
        }
        Err(err) => {
            span.in_scope(|| warn!(%correlation_id, error = %err, "authentication failed"));
            Err(ApiError::from(err))
        }
    }
}
