//! Tweets: short text posts owned by an account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;

use crate::domain::{TweetId, UserId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct TweetRow {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TweetRow> for Tweet {
    fn from(row: TweetRow) -> Self {
        Tweet {
            id: TweetId::from_string(row.id),
            content: row.content,
            owner: UserId::from_string(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: TweetId,
    pub content: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTweet {
    pub id: TweetId,
    pub owner: UserId,
    pub content: String,
}

#[async_trait]
pub trait TweetRepository: Send + Sync {
    async fn create_tweet(&self, tweet: NewTweet) -> Result<Tweet>;

    async fn get_tweet(&self, id: &TweetId) -> Result<Option<Tweet>>;

    /// Tweets owned by `owner`, newest first
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Tweet>>;

    async fn update_content(&self, id: &TweetId, content: &str) -> Result<Tweet>;

    async fn delete_tweet(&self, id: &TweetId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxTweetRepository {
    pool: DbPool,
}

impl SqlxTweetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TweetRepository for SqlxTweetRepository {
    #[instrument(skip(self, tweet), fields(tweet_id = %tweet.id, owner = %tweet.owner), name = "db_create_tweet")]
    async fn create_tweet(&self, tweet: NewTweet) -> Result<Tweet> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO tweets (id, content, owner_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&tweet.id)
        .bind(&tweet.content)
        .bind(&tweet.owner)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to create tweet"))?;

        self.get_tweet(&tweet.id)
            .await?
            .ok_or_else(|| Error::internal("Tweet not found after creation"))
    }

    #[instrument(skip(self), fields(tweet_id = %id), name = "db_get_tweet")]
    async fn get_tweet(&self, id: &TweetId) -> Result<Option<Tweet>> {
        let row = sqlx::query_as::<_, TweetRow>(
            "SELECT id, content, owner_id, created_at, updated_at FROM tweets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to fetch tweet"))?;

        Ok(row.map(Tweet::from))
    }

    #[instrument(skip(self), fields(owner = %owner), name = "db_list_tweets_by_owner")]
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Tweet>> {
        let rows = sqlx::query_as::<_, TweetRow>(
            r#"
            SELECT id, content, owner_id, created_at, updated_at
            FROM tweets
            WHERE owner_id = $1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::database(err, "Failed to list tweets"))?;

        Ok(rows.into_iter().map(Tweet::from).collect())
    }

    #[instrument(skip(self, content), fields(tweet_id = %id), name = "db_update_tweet")]
    async fn update_content(&self, id: &TweetId, content: &str) -> Result<Tweet> {
        let result = sqlx::query("UPDATE tweets SET content = $1, updated_at = $2 WHERE id = $3")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to update tweet"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Tweet", id.as_str()));
        }

        self.get_tweet(id).await?.ok_or_else(|| Error::not_found("Tweet", id.as_str()))
    }

    #[instrument(skip(self), fields(tweet_id = %id), name = "db_delete_tweet")]
    async fn delete_tweet(&self, id: &TweetId) -> Result<()> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| Error::database(err, "Failed to delete tweet"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Tweet", id.as_str()));
        }

        Ok(())
    }
}
