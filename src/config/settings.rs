//! # Configuration Settings
//!
//! Defines the configuration sections for the videotube backend. Each section
//! can be built from environment variables and is validated with `validator`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Deployment environment. Controls cookie `Secure` flags and error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match std::env::var("VIDEOTUBE_ENV").map(|v| v.to_lowercase()) {
            Ok(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Allowed CORS origin (None = same-origin only)
    pub cors_origin: Option<String>,

    /// Request body limit for JSON payloads
    #[validate(range(min = 1024, message = "Max body size must be at least 1KB"))]
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: None,
            max_body_size: 16 * 1024,
        }
    }
}

impl ApiServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: std::env::var("VIDEOTUBE_API_BIND_ADDRESS")
                .unwrap_or(defaults.bind_address),
            port: env_parse("VIDEOTUBE_API_PORT").or_else(|| env_parse("PORT")).unwrap_or(defaults.port),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            max_body_size: env_parse("VIDEOTUBE_API_MAX_BODY_SIZE")
                .unwrap_or(defaults.max_body_size),
        }
    }

    /// Get the server bind address
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 60, message = "Connect timeout must be between 1 and 60 seconds"))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/videotube.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            connect_timeout_seconds: env_parse("DATABASE_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or(defaults.connect_timeout_seconds),
            idle_timeout_seconds: env_parse("DATABASE_IDLE_TIMEOUT_SECONDS")
                .unwrap_or(defaults.idle_timeout_seconds),
            auto_migrate: std::env::var("DATABASE_AUTO_MIGRATE")
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(defaults.auto_migrate),
        }
    }
}

/// Token signing configuration. Access and refresh tokens use distinct secrets.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// Secret for access token signing/verification
    #[validate(length(min = 32, message = "Access token secret must be at least 32 characters"))]
    pub access_token_secret: String,

    /// Access token lifetime in seconds
    #[validate(range(min = 60, message = "Access token expiry must be at least one minute"))]
    pub access_token_expiry_seconds: u64,

    /// Secret for refresh token signing/verification
    #[validate(length(min = 32, message = "Refresh token secret must be at least 32 characters"))]
    pub refresh_token_secret: String,

    /// Refresh token lifetime in seconds
    #[validate(range(min = 60, message = "Refresh token expiry must be at least one minute"))]
    pub refresh_token_expiry_seconds: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"***")
            .field("access_token_expiry_seconds", &self.access_token_expiry_seconds)
            .field("refresh_token_secret", &"***")
            .field("refresh_token_expiry_seconds", &self.refresh_token_expiry_seconds)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "videotube-dev-access-secret-change-me-in-production".to_string(),
            access_token_expiry_seconds: 24 * 60 * 60,
            refresh_token_secret: "videotube-dev-refresh-secret-change-me-in-production"
                .to_string(),
            refresh_token_expiry_seconds: 10 * 24 * 60 * 60,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or(defaults.access_token_secret),
            access_token_expiry_seconds: env_parse("ACCESS_TOKEN_EXPIRY_SECONDS")
                .unwrap_or(defaults.access_token_expiry_seconds),
            refresh_token_secret: std::env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or(defaults.refresh_token_secret),
            refresh_token_expiry_seconds: env_parse("REFRESH_TOKEN_EXPIRY_SECONDS")
                .unwrap_or(defaults.refresh_token_expiry_seconds),
        }
    }

    pub fn access_token_expiry(&self) -> Duration {
        Duration::from_secs(self.access_token_expiry_seconds)
    }

    pub fn refresh_token_expiry(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expiry_seconds)
    }
}

/// Media hosting configuration (Cloudinary-compatible upload API)
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct BlobStoreConfig {
    /// Cloud name used in upload URLs
    pub cloud_name: String,

    pub api_key: String,

    pub api_secret: String,

    /// API base URL, overridable for tests and self-hosted gateways
    #[validate(url(message = "Blob store base URL must be a valid URL"))]
    pub base_url: String,

    /// Directory where incoming multipart files are staged before upload
    pub temp_dir: PathBuf,

    /// Upload/delete request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for BlobStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("base_url", &self.base_url)
            .field("temp_dir", &self.temp_dir)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            base_url: "https://api.cloudinary.com".to_string(),
            temp_dir: PathBuf::from("./public/temp"),
            timeout_seconds: 30,
        }
    }
}

impl BlobStoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cloud_name: std::env::var("CLOUDINARY_NAME").unwrap_or(defaults.cloud_name),
            api_key: std::env::var("CLOUDINARY_API_KEY").unwrap_or(defaults.api_key),
            api_secret: std::env::var("CLOUDINARY_API_SECRET").unwrap_or(defaults.api_secret),
            base_url: std::env::var("CLOUDINARY_BASE_URL").unwrap_or(defaults.base_url),
            temp_dir: std::env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            timeout_seconds: env_parse("CLOUDINARY_TIMEOUT_SECONDS")
                .unwrap_or(defaults.timeout_seconds),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level or full `EnvFilter` directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
            service_name: "videotube".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: std::env::var("LOG_JSON")
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(defaults.json_logging),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}
