//! # Configuration Management
//!
//! Application configuration assembled from environment variables. Callers load
//! an optional `.env` file with `dotenvy` before calling [`Config::from_env`].

mod settings;

pub use settings::{
    ApiServerConfig, AuthConfig, BlobStoreConfig, DatabaseConfig, Environment,
    ObservabilityConfig,
};

use validator::Validate;

use crate::{Error, Result};

/// Full application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub environment: Environment,
    pub api: ApiServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub blob_store: BlobStoreConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Create configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let config = Self {
            environment: Environment::from_env(),
            api: ApiServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env(),
            blob_store: BlobStoreConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section, then the cross-section rules
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.blob_store.validate()?;
        self.observability.validate()?;

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(Error::config("Access and refresh token secrets must differ"));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(Error::config("min_connections cannot be greater than max_connections"));
        }

        if self.environment.is_production() && !self.blob_store.is_configured() {
            return Err(Error::config("Cloudinary credentials are required in production"));
        }

        Ok(())
    }
}
