use std::sync::Arc;

use videotube::{
    api::{start_api_server, ApiState},
    blob::CloudinaryStore,
    observability::{init_logging, log_config_info},
    storage::create_pool,
    Config, Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists; must happen before any config is read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = Config::from_env()?;
    init_logging(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting videotube backend");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    let blobs = Arc::new(CloudinaryStore::new(config.blob_store.clone())?);
    let state = ApiState::new(pool.clone(), &config, blobs);

    let result = start_api_server(&config.api, state).await;
    if let Err(e) = &result {
        error!(error = %e, "API server terminated with error");
    }

    pool.close().await;
    info!("Shutdown complete");
    result
}
