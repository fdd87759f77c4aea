//! Repository traits and their SQLite implementations.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{Comment, CommentRepository, NewComment, SqlxCommentRepository};
pub use like::{Like, LikeRepository, LikeTarget, SqlxLikeRepository};
pub use playlist::{NewPlaylist, Playlist, PlaylistRepository, SqlxPlaylistRepository};
pub use subscription::{
    ChannelProfile, SqlxSubscriptionRepository, Subscription, SubscriptionRepository,
};
pub use tweet::{NewTweet, SqlxTweetRepository, Tweet, TweetRepository};
pub use user::{SqlxUserRepository, UserCredentials, UserRepository};
pub use video::{NewVideo, SqlxVideoRepository, StoredMedia, Video, VideoChanges, VideoRepository};
