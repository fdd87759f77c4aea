//! Manual migration runner
//!
//! Applies pending migrations to the database named by `DATABASE_URL` and
//! prints the resulting tables.
//! Usage: cargo run --bin run_migrations

use videotube::{config::DatabaseConfig, storage::create_pool};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let db_config = DatabaseConfig {
        max_connections: 1,
        min_connections: 0,
        auto_migrate: false,
        ..DatabaseConfig::from_env()
    };
    let pool = create_pool(&db_config).await?;
    info!("Connected to database");

    videotube::storage::run_migrations(&pool).await?;

    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;
    info!(?tables, "Tables in database");

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&pool)
        .await?;
    info!(applied = count, "Migration completed successfully");

    Ok(())
}
