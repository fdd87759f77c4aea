//! Channel subscriptions. A channel is any account; subscribing is per (subscriber, channel).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::auth::user::User;
use crate::domain::{SubscriptionId, UserId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

const PUBLIC_USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.fullname, u.avatar, u.cover_image, u.created_at, u.updated_at";

#[derive(Debug, Clone, FromRow)]
struct SubscriptionRow {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: SubscriptionId::from_string(row.id),
            subscriber: UserId::from_string(row.subscriber_id),
            channel: UserId::from_string(row.channel_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct PublicUserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PublicUserRow> for User {
    fn from(row: PublicUserRow) -> Self {
        User {
            id: UserId::from_string(row.id),
            username: row.username,
            email: row.email,
            fullname: row.fullname,
            avatar: row.avatar,
            cover_image: row.cover_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ChannelProfileRow {
    #[sqlx(flatten)]
    pub user: PublicUserRow,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub subscriber: UserId,
    pub channel: UserId,
    pub created_at: DateTime<Utc>,
}

/// Public channel page: the account plus its subscription counts as seen by one viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub user: User,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Remove the subscription if present, otherwise create it.
    ///
    /// Returns the new subscription, or `None` when one was removed.
    async fn toggle(&self, subscriber: &UserId, channel: &UserId) -> Result<Option<Subscription>>;

    /// Accounts subscribed to `channel`, most recent first
    async fn list_subscribers(&self, channel: &UserId) -> Result<Vec<User>>;

    /// Channels `subscriber` follows, most recent first
    async fn list_channels(&self, subscriber: &UserId) -> Result<Vec<User>>;

    async fn channel_profile(&self, username: &str, viewer: &UserId) -> Result<Option<ChannelProfile>>;
}

#[derive(Debug, Clone)]
pub struct SqlxSubscriptionRepository {
    pool: DbPool,
}

impl SqlxSubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn list_users(&self, sql: &str, id: &UserId, context: &str) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, PublicUserRow>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| Error::database(err, context))?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl SubscriptionRepository for SqlxSubscriptionRepository {
    #[instrument(skip(self), fields(subscriber = %subscriber, channel = %channel), name = "db_toggle_subscription")]
    async fn toggle(&self, subscriber: &UserId, channel: &UserId) -> Result<Option<Subscription>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| Error::database(err, "Failed to begin subscription transaction"))?;

        let removed = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
            .bind(subscriber)
            .bind(channel)
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::database(err, "Failed to remove subscription"))?;

        if removed.rows_affected() > 0 {
            tx.commit().await.map_err(|err| Error::database(err, "Failed to commit unsubscribe"))?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, SubscriptionRow>(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, subscriber_id, channel_id, created_at",
        )
        .bind(SubscriptionId::new())
        .bind(subscriber)
        .bind(channel)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| Error::database(err, "Failed to create subscription"))?;

        tx.commit().await.map_err(|err| Error::database(err, "Failed to commit subscription"))?;
        Ok(Some(Subscription::from(row)))
    }

    #[instrument(skip(self), fields(channel = %channel), name = "db_list_subscribers")]
    async fn list_subscribers(&self, channel: &UserId) -> Result<Vec<User>> {
        self.list_users(
            &format!(
                "SELECT {} FROM subscriptions s JOIN users u ON u.id = s.subscriber_id \
                 WHERE s.channel_id = $1 ORDER BY s.created_at DESC, s.rowid DESC",
                PUBLIC_USER_COLUMNS
            ),
            channel,
            "Failed to list subscribers",
        )
        .await
    }

    #[instrument(skip(self), fields(subscriber = %subscriber), name = "db_list_subscribed_channels")]
    async fn list_channels(&self, subscriber: &UserId) -> Result<Vec<User>> {
        self.list_users(
            &format!(
                "SELECT {} FROM subscriptions s JOIN users u ON u.id = s.channel_id \
                 WHERE s.subscriber_id = $1 ORDER BY s.created_at DESC, s.rowid DESC",
                PUBLIC_USER_COLUMNS
            ),
            subscriber,
            "Failed to list subscribed channels",
        )
        .await
    }

    #[instrument(skip(self), fields(viewer = %viewer), name = "db_channel_profile")]
    async fn channel_profile(&self, username: &str, viewer: &UserId) -> Result<Option<ChannelProfile>> {
        let row = sqlx::query_as::<_, ChannelProfileRow>(&format!(
            r#"
            SELECT {},
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                EXISTS (SELECT 1 FROM subscriptions s WHERE s.channel_id = u.id AND s.subscriber_id = $2) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
            PUBLIC_USER_COLUMNS
        ))
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to load channel profile"))?;

        Ok(row.map(|row| ChannelProfile {
            user: User::from(row.user),
            subscribers_count: row.subscribers_count,
            channels_subscribed_to_count: row.channels_subscribed_to_count,
            is_subscribed: row.is_subscribed,
        }))
    }
}
