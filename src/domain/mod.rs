//! Domain identifiers shared across storage, services and the API layer.

pub mod id;

pub use id::{CommentId, LikeId, PlaylistId, SubscriptionId, TweetId, UserId, VideoId};
