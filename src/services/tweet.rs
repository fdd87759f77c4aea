//! Tweets with owner-only access.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::require_content;
use crate::domain::{TweetId, UserId};
use crate::errors::{Error, Result};
use crate::storage::{DbPool, NewTweet, SqlxTweetRepository, Tweet, TweetRepository};

#[derive(Clone)]
pub struct TweetService {
    tweets: Arc<dyn TweetRepository>,
}

impl TweetService {
    pub fn new(tweets: Arc<dyn TweetRepository>) -> Self {
        Self { tweets }
    }

    pub fn with_sqlx(pool: DbPool) -> Self {
        Self::new(Arc::new(SqlxTweetRepository::new(pool)))
    }

    #[instrument(skip(self, content), fields(owner = %owner))]
    pub async fn create(&self, owner: &UserId, content: &str) -> Result<Tweet> {
        let content = require_content(content)?;
        let tweet = self
            .tweets
            .create_tweet(NewTweet { id: TweetId::new(), owner: owner.clone(), content: content.to_string() })
            .await?;
        info!(tweet_id = %tweet.id, "tweet created");
        Ok(tweet)
    }

    /// List a user's tweets. Only the user themselves may list them.
    #[instrument(skip(self), fields(requester = %requester, user_id = %user_id))]
    pub async fn list_for_user(&self, requester: &UserId, user_id: &UserId) -> Result<Vec<Tweet>> {
        if requester != user_id {
            warn!("tweet listing for another user refused");
            return Err(Error::forbidden("You are not authorized to view these tweets"));
        }
        self.tweets.list_by_owner(user_id).await
    }

    #[instrument(skip(self, content), fields(requester = %requester, tweet_id = %tweet_id))]
    pub async fn update(&self, requester: &UserId, tweet_id: &TweetId, content: &str) -> Result<Tweet> {
        let content = require_content(content)?;
        self.owned(requester, tweet_id).await?;
        self.tweets.update_content(tweet_id, content).await
    }

    #[instrument(skip(self), fields(requester = %requester, tweet_id = %tweet_id))]
    pub async fn delete(&self, requester: &UserId, tweet_id: &TweetId) -> Result<()> {
        self.owned(requester, tweet_id).await?;
        self.tweets.delete_tweet(tweet_id).await?;
        info!("tweet deleted");
        Ok(())
    }

    async fn owned(&self, requester: &UserId, tweet_id: &TweetId) -> Result<Tweet> {
        let tweet = self
            .tweets
            .get_tweet(tweet_id)
            .await?
            .ok_or_else(|| Error::not_found("Tweet", tweet_id.as_str()))?;

        if &tweet.owner != requester {
            warn!(owner = %tweet.owner, "tweet modification by non-owner refused");
            return Err(Error::forbidden("You are not authorized to modify this tweet"));
        }
        Ok(tweet)
    }
}
