use crate::config::DatabaseConfig;
use crate::storage::{create_pool, DbPool};

/// Fresh migrated in-memory database. One connection, so every query sees the same database.
pub(crate) async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        idle_timeout_seconds: 0,
        auto_migrate: true,
        ..Default::default()
    };
    create_pool(&config).await.expect("in-memory pool")
}

/// Insert an account named `username` and return its id.
pub(crate) async fn seed_user(pool: &DbPool, username: &str) -> crate::domain::UserId {
    use crate::storage::{SqlxUserRepository, UserRepository};

    SqlxUserRepository::new(pool.clone())
        .create_user(crate::auth::user::NewUser {
            id: crate::domain::UserId::new(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            fullname: username.to_string(),
            avatar: format!("https://cdn.example/{}.png", username),
            cover_image: None,
            password_hash: "hash".into(),
        })
        .await
        .expect("seed user")
        .id
}

/// Video row fixture whose asset public ids are `{title}-video` and `{title}-thumb`.
pub(crate) fn new_video(owner: &crate::domain::UserId, title: &str) -> crate::storage::NewVideo {
    use crate::storage::StoredMedia;

    crate::storage::NewVideo {
        id: crate::domain::VideoId::new(),
        owner: owner.clone(),
        title: title.into(),
        description: format!("{} description", title),
        video_file: StoredMedia {
            url: format!("https://cdn.example/{}.mp4", title),
            public_id: format!("{}-video", title),
        },
        thumbnail: StoredMedia {
            url: format!("https://cdn.example/{}.png", title),
            public_id: format!("{}-thumb", title),
        },
        duration: 42.0,
    }
}

pub(crate) async fn seed_video(
    pool: &DbPool,
    owner: &crate::domain::UserId,
    title: &str,
) -> crate::storage::Video {
    use crate::storage::{SqlxVideoRepository, VideoRepository};

    SqlxVideoRepository::new(pool.clone())
        .create_video(new_video(owner, title))
        .await
        .expect("seed video")
}
