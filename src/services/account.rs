//! Account registration and profile maintenance.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::hashing;
use crate::auth::user::{NewUser, User};
use crate::blob::{BlobStore, UploadedAsset};
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::{DbPool, SqlxUserRepository, UserRepository};

/// Registration input. Files are already staged on local disk.
#[derive(Clone, Default)]
pub struct RegisterUser {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar_path: Option<PathBuf>,
    pub cover_path: Option<PathBuf>,
}

impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"***")
            .field("avatar_path", &self.avatar_path)
            .field("cover_path", &self.cover_path)
            .finish()
    }
}

impl RegisterUser {
    fn validate(&self) -> Result<()> {
        for (value, field) in [
            (&self.fullname, "fullname"),
            (&self.email, "email"),
            (&self.username, "username"),
            (&self.password, "password"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation_field("All fields are required", field));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { users, blobs }
    }

    pub fn with_sqlx(pool: DbPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self::new(Arc::new(SqlxUserRepository::new(pool)), blobs)
    }

    /// Create an account with its avatar (and optional cover image).
    ///
    /// Any asset uploaded for this request is deleted again if a later step fails.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterUser) -> Result<User> {
        let staged: Vec<PathBuf> =
            input.avatar_path.iter().chain(input.cover_path.iter()).cloned().collect();

        let result = self.register_inner(input).await;
        if result.is_err() {
            // Staged files that never reached the blob store are dropped here
            for path in &staged {
                crate::blob::discard_local_file(path).await;
            }
        }
        result
    }

    async fn register_inner(&self, input: RegisterUser) -> Result<User> {
        input.validate()?;

        let username = User::normalize_username(&input.username);
        let email = User::normalize_email(&input.email);

        if self.users.find_by_username_or_email(Some(&username), Some(&email)).await?.is_some() {
            return Err(Error::conflict("User with email or username already exists", "user"));
        }

        let avatar_path = input
            .avatar_path
            .as_deref()
            .ok_or_else(|| Error::validation_field("Avatar file is required", "avatar"))?;

        let password_hash = hashing::hash_password(&input.password)?;

        let avatar = self
            .blobs
            .upload(avatar_path)
            .await
            .ok_or_else(|| Error::upstream("Avatar upload failed"))?;
        let mut uploaded = vec![avatar.clone()];

        let cover = match input.cover_path.as_deref() {
            Some(path) => match self.blobs.upload(path).await {
                Some(asset) => {
                    uploaded.push(asset.clone());
                    Some(asset)
                }
                None => {
                    self.compensate(&uploaded).await;
                    return Err(Error::upstream("Cover image upload failed"));
                }
            },
            None => None,
        };

        let new_user = NewUser {
            id: UserId::new(),
            username,
            email,
            fullname: input.fullname.trim().to_string(),
            avatar: avatar.url,
            cover_image: cover.map(|c| c.url),
            password_hash,
        };

        match self.users.create_user(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "user registered");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "account creation failed, removing uploaded assets");
                self.compensate(&uploaded).await;
                Err(err)
            }
        }
    }

    async fn compensate(&self, uploaded: &[UploadedAsset]) {
        for asset in uploaded {
            if self.blobs.delete(&asset.public_id).await.is_none() {
                warn!(public_id = %asset.public_id, "compensating asset deletion failed");
            }
        }
    }

    /// Update display name and contact address
    #[instrument(skip(self, fullname, email), fields(user_id = %user_id))]
    pub async fn update_account(&self, user_id: &UserId, fullname: &str, email: &str) -> Result<User> {
        if fullname.trim().is_empty() {
            return Err(Error::validation_field("All fields are required", "fullname"));
        }
        if email.trim().is_empty() {
            return Err(Error::validation_field("All fields are required", "email"));
        }

        self.users.update_account(user_id, fullname.trim(), &User::normalize_email(email)).await
    }

    #[instrument(skip(self, path), fields(user_id = %user_id))]
    pub async fn update_avatar(&self, user_id: &UserId, path: Option<PathBuf>) -> Result<User> {
        let path = path.ok_or_else(|| Error::validation_field("Avatar file is missing", "avatar"))?;
        let asset = self
            .blobs
            .upload(&path)
            .await
            .ok_or_else(|| Error::upstream("Error while uploading avatar"))?;

        self.users.update_avatar(user_id, &asset.url).await
    }

    #[instrument(skip(self, path), fields(user_id = %user_id))]
    pub async fn update_cover_image(&self, user_id: &UserId, path: Option<PathBuf>) -> Result<User> {
        let path =
            path.ok_or_else(|| Error::validation_field("Cover image file is missing", "coverImage"))?;
        let asset = self
            .blobs
            .upload(&path)
            .await
            .ok_or_else(|| Error::upstream("Error while uploading cover image"))?;

        self.users.update_cover_image(user_id, &asset.url).await
    }
}
