//! Business services that sit between the HTTP handlers and the repositories.

pub mod account;
pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod video;

pub use account::{AccountService, RegisterUser};
pub use comment::CommentService;
pub use like::{LikeService, LikeToggle};
pub use playlist::{PlaylistDetails, PlaylistService};
pub use subscription::SubscriptionService;
pub use tweet::TweetService;
pub use video::{PublishVideo, UpdateVideo, VideoService};

use crate::errors::{Error, Result};

/// Trimmed text body of a tweet or comment; blank is a validation error.
pub(crate) fn require_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation_field("Content is required", "content"));
    }
    Ok(content)
}

/// Treat blank optional text as absent
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
