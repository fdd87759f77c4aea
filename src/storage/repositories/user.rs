//! Credential store: account rows, password hashes and the rotating refresh token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use crate::auth::user::{NewUser, User};
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;

const USER_COLUMNS: &str = "id, username, email, fullname, avatar, cover_image, password_hash, \
                            refresh_token, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account plus the secrets that never leave the storage and session layers.
#[derive(Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new account. Duplicate username or email is a `Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Find an account matching either identifier. `None` identifiers never match.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>>;

    /// Same lookup as [`find_by_username_or_email`](Self::find_by_username_or_email),
    /// including the password hash and stored refresh token.
    async fn get_credentials_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserCredentials>>;

    async fn get_credentials(&self, id: &UserId) -> Result<Option<UserCredentials>>;

    /// Overwrite (or clear with `None`) the stored refresh token unconditionally
    async fn set_refresh_token(&self, id: &UserId, token: Option<&str>) -> Result<()>;

    /// Replace the stored refresh token only if it still equals `presented`.
    ///
    /// Returns `false` when no row matched, i.e. the token was already rotated,
    /// cleared, or the account is gone.
    async fn rotate_refresh_token(&self, id: &UserId, presented: &str, next: &str)
        -> Result<bool>;

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<()>;

    async fn update_account(&self, id: &UserId, fullname: &str, email: &str) -> Result<User>;

    async fn update_avatar(&self, id: &UserId, url: &str) -> Result<User>;

    async fn update_cover_image(&self, id: &UserId, url: &str) -> Result<User>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &UserRow) -> User {
        User {
            id: UserId::from_string(row.id.clone()),
            username: row.username.clone(),
            email: row.email.clone(),
            fullname: row.fullname.clone(),
            avatar: row.avatar.clone(),
            cover_image: row.cover_image.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_to_credentials(row: UserRow) -> UserCredentials {
        let user = Self::row_to_user(&row);
        UserCredentials { user, password_hash: row.password_hash, refresh_token: row.refresh_token }
    }

    async fn fetch_row_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        // A username match outranks an email match belonging to another account
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 \
             ORDER BY COALESCE(username = $1, 0) DESC LIMIT 1",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to look up user by login"))
    }

    async fn fetch_row(&self, id: &UserId) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to fetch user"))
    }

    async fn require_user(&self, id: &UserId) -> Result<User> {
        self.get_user(id).await?.ok_or_else(|| Error::not_found("User", id.as_str()))
    }
}

fn map_write_error(err: sqlx::Error, context: &str) -> Error {
    let unique = err.as_database_error().map(|db| db.is_unique_violation()).unwrap_or(false);
    if unique {
        Error::conflict("User with email or username already exists", "user")
    } else {
        Error::database(err, context)
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username), name = "db_create_user")]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, fullname, avatar, cover_image, password_hash, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.fullname)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "Failed to create user"))?;

        self.get_user(&user.id)
            .await?
            .ok_or_else(|| Error::internal("User not found after creation"))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_get_user")]
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.fetch_row(id).await?.as_ref().map(Self::row_to_user))
    }

    #[instrument(skip(self), name = "db_find_user_by_login")]
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        Ok(self.fetch_row_by_login(username, email).await?.as_ref().map(Self::row_to_user))
    }

    #[instrument(skip(self), name = "db_get_credentials_by_login")]
    async fn get_credentials_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserCredentials>> {
        Ok(self.fetch_row_by_login(username, email).await?.map(Self::row_to_credentials))
    }

    #[instrument(skip(self), fields(user_id = %id), name = "db_get_credentials")]
    async fn get_credentials(&self, id: &UserId) -> Result<Option<UserCredentials>> {
        Ok(self.fetch_row(id).await?.map(Self::row_to_credentials))
    }

    #[instrument(skip(self, token), fields(user_id = %id, clearing = token.is_none()), name = "db_set_refresh_token")]
    async fn set_refresh_token(&self, id: &UserId, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to store refresh token"))?;

        Ok(())
    }

    #[instrument(skip(self, presented, next), fields(user_id = %id), name = "db_rotate_refresh_token")]
    async fn rotate_refresh_token(
        &self,
        id: &UserId,
        presented: &str,
        next: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $1, updated_at = $2 WHERE id = $3 AND refresh_token = $4",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(id)
        .bind(presented)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to rotate refresh token"))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, password_hash), fields(user_id = %id), name = "db_update_password")]
    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|err| Error::database(err, "Failed to update password"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("User", id.as_str()));
        }

        Ok(())
    }

    #[instrument(skip(self, fullname, email), fields(user_id = %id), name = "db_update_account")]
    async fn update_account(&self, id: &UserId, fullname: &str, email: &str) -> Result<User> {
        sqlx::query("UPDATE users SET fullname = $1, email = $2, updated_at = $3 WHERE id = $4")
            .bind(fullname)
            .bind(email)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| map_write_error(err, "Failed to update account"))?;

        self.require_user(id).await
    }

    #[instrument(skip(self, url), fields(user_id = %id), name = "db_update_avatar")]
    async fn update_avatar(&self, id: &UserId, url: &str) -> Result<User> {
        sqlx::query("UPDATE users SET avatar = $1, updated_at = $2 WHERE id = $3")
            .bind(url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to update avatar"))?;

        self.require_user(id).await
    }

    #[instrument(skip(self, url), fields(user_id = %id), name = "db_update_cover_image")]
    async fn update_cover_image(&self, id: &UserId, url: &str) -> Result<User> {
        sqlx::query("UPDATE users SET cover_image = $1, updated_at = $2 WHERE id = $3")
            .bind(url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to update cover image"))?;

        self.require_user(id).await
    }
}
