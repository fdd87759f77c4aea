//! # Videotube
//!
//! Backend for a video-sharing platform. The core is the authenticated session
//! lifecycle: short-lived access tokens, long-lived rotating refresh tokens
//! stored server-side, and cookie or bearer transport.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API (axum) → Session middleware → Services → Repositories (sqlx/SQLite)
//!                                           ↓
//!                                      Blob store (Cloudinary)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use videotube::{api::{start_api_server, ApiState}, blob::CloudinaryStore, storage::create_pool, Config};
//!
//! #[tokio::main]
//! async fn main() -> videotube::Result<()> {
//!     let config = Config::from_env()?;
//!     let pool = create_pool(&config.database).await?;
//!     let blobs = Arc::new(CloudinaryStore::new(config.blob_store.clone())?);
//!     let state = ApiState::new(pool, &config, blobs);
//!     start_api_server(&config.api, state).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod blob;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{Config, Environment};
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
