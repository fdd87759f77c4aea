//! Channel subscriptions and the public channel profile.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::user::User;
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::{
    ChannelProfile, DbPool, SqlxSubscriptionRepository, SqlxUserRepository, Subscription,
    SubscriptionRepository, UserRepository,
};

#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
}

impl SubscriptionService {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { subscriptions, users }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(
            Arc::new(SqlxSubscriptionRepository::new(pool.clone())),
            Arc::new(SqlxUserRepository::new(pool)),
        )
    }

    /// Subscribe to `channel`, or unsubscribe if already subscribed.
    ///
    /// Returns the new subscription, or `None` after unsubscribing.
    #[instrument(skip(self), fields(subscriber = %subscriber, channel = %channel))]
    pub async fn toggle(&self, subscriber: &UserId, channel: &UserId) -> Result<Option<Subscription>> {
        if subscriber == channel {
            return Err(Error::validation_field("You cannot subscribe to your own channel", "channelId"));
        }
        self.require_account(channel).await?;

        let subscription = self.subscriptions.toggle(subscriber, channel).await?;
        info!(subscribed = subscription.is_some(), "subscription toggled");
        Ok(subscription)
    }

    #[instrument(skip(self), fields(channel = %channel))]
    pub async fn subscribers(&self, channel: &UserId) -> Result<Vec<User>> {
        self.require_account(channel).await?;
        self.subscriptions.list_subscribers(channel).await
    }

    #[instrument(skip(self), fields(subscriber = %subscriber))]
    pub async fn subscribed_channels(&self, subscriber: &UserId) -> Result<Vec<User>> {
        self.require_account(subscriber).await?;
        self.subscriptions.list_channels(subscriber).await
    }

    /// Channel page for `username` as seen by `viewer`
    #[instrument(skip(self), fields(viewer = %viewer))]
    pub async fn channel_profile(&self, viewer: &UserId, username: &str) -> Result<ChannelProfile> {
        let username = User::normalize_username(username);
        if username.is_empty() {
            return Err(Error::validation_field("Username is missing", "username"));
        }
        self.subscriptions
            .channel_profile(&username, viewer)
            .await?
            .ok_or_else(|| Error::not_found("Channel", username))
    }

    async fn require_account(&self, id: &UserId) -> Result<()> {
        match self.users.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::not_found("Channel", id.as_str())),
        }
    }
}
