//! Domain ID Types with NewType Pattern
//!
//! Type-safe wrappers for identifiers so a tweet id can never be passed where
//! a user id is expected. Ids are UUID v4 strings stored as TEXT.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! domain_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap a value read back from storage or a token subject
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }

            /// Parse a path or body value, rejecting anything that is not a UUID.
            ///
            /// Any accepted spelling is stored in the lowercase hyphenated form ids are minted in.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

domain_id!(
    /// Identifier of a registered account
    UserId
);

domain_id!(
    /// Identifier of a tweet
    TweetId
);

domain_id!(
    /// Identifier of a published video
    VideoId
);

domain_id!(
    /// Identifier of a comment on a video
    CommentId
);

domain_id!(
    /// Identifier of a like on a video, comment or tweet
    LikeId
);

domain_id!(
    /// Identifier of a channel subscription
    SubscriptionId
);

domain_id!(
    /// Identifier of a playlist
    PlaylistId
);
