//! Session lifecycle: login, logout, refresh rotation and password change.
//!
//! The stored refresh token is the single source of truth for a session. It
//! moves `None -> Some(v)` on login, `Some(v1) -> Some(v2)` on refresh and back to
//! `None` on logout. A presented refresh token is honoured only while it is
//! byte-identical to the stored one.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::auth::hashing;
use crate::auth::token_issuer::{TokenIssuer, TokenPair};
use crate::auth::user::User;
use crate::domain::UserId;
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::{DbPool, SqlxUserRepository, UserRepository};

/// Login payload. At least one of `username` or `email` is required.
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Successful login: the sanitised account and its new token pair
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    issuer: Arc<TokenIssuer>,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserRepository>, issuer: Arc<TokenIssuer>) -> Self {
        Self { users, issuer }
    }

    pub fn with_sqlx(pool: DbPool, issuer: Arc<TokenIssuer>) -> Self {
        Self::new(Arc::new(SqlxUserRepository::new(pool)), issuer)
    }

    /// Verify credentials, mint a pair and make its refresh token the stored one.
    #[instrument(skip(self, request), fields(username = ?request.username, email = ?request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        let username = non_blank(request.username.as_deref()).map(User::normalize_username);
        let email = non_blank(request.email.as_deref()).map(User::normalize_email);

        if username.is_none() && email.is_none() {
            return Err(Error::validation_field("username or email is required", "username"));
        }
        if request.password.is_empty() {
            return Err(Error::validation_field("Password is required", "password"));
        }

        let credentials = self
            .users
            .get_credentials_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| {
                Error::not_found("User", username.as_deref().or(email.as_deref()).unwrap_or_default())
            })?;

        if !hashing::verify_password(&request.password, &credentials.password_hash)? {
            warn!(user_id = %credentials.user.id, "login attempt with incorrect password");
            return Err(Error::auth("Invalid user credentials", AuthErrorType::InvalidCredentials));
        }

        let user = credentials.user;
        let tokens = self.issuer.mint(&user)?;
        self.users.set_refresh_token(&user.id, Some(&tokens.refresh_token)).await?;

        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome { user, tokens })
    }

    /// Clear the stored refresh token. Idempotent.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn logout(&self, user_id: &UserId) -> Result<()> {
        self.users.set_refresh_token(user_id, None).await?;
        info!("user logged out");
        Ok(())
    }

    /// Exchange the current refresh token for a new pair, invalidating the old one.
    #[instrument(skip(self, presented))]
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair> {
        let presented = non_blank(presented)
            .ok_or_else(|| Error::auth("Refresh token is required", AuthErrorType::MissingToken))?;

        let user_id = self.issuer.verify_refresh(presented).map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            Error::invalid_token("Invalid refresh token")
        })?;

        let credentials = self
            .users
            .get_credentials(&user_id)
            .await?
            .ok_or_else(|| Error::invalid_token("Invalid refresh token"))?;

        if credentials.refresh_token.as_deref() != Some(presented) {
            warn!(user_id = %user_id, "refresh token is not the current one");
            return Err(Error::invalid_token("Refresh token is expired or used"));
        }

        let tokens = self.issuer.mint(&credentials.user)?;

        // Only one of two concurrent refreshes with the same token can match here.
        if !self.users.rotate_refresh_token(&user_id, presented, &tokens.refresh_token).await? {
            warn!(user_id = %user_id, "refresh token rotated concurrently");
            return Err(Error::invalid_token("Refresh token is expired or used"));
        }

        info!(user_id = %user_id, "refresh token rotated");
        Ok(tokens)
    }

    /// Replace the password hash after checking the old password.
    ///
    /// The stored refresh token is left as is.
    #[instrument(skip(self, old_password, new_password), fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::validation_field("New password is required", "newPassword"));
        }

        let credentials = self
            .users
            .get_credentials(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id.as_str()))?;

        if !hashing::verify_password(old_password, &credentials.password_hash)? {
            warn!("password change with incorrect old password");
            return Err(Error::auth("Invalid old password", AuthErrorType::InvalidCredentials));
        }

        let hash = hashing::hash_password(new_password)?;
        self.users.update_password(user_id, &hash).await?;

        info!("password changed");
        Ok(())
    }
}
