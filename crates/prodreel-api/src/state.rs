//! Application state.

use std::time::Duration;

use prodreel_db::DbPool;
use prodreel_kling::{KlingClient, KlingConfig};

use crate::config::ApiConfig;

/// Downloads of remotely-hosted videos can take a while.
const MEDIA_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub db: DbPool,
    pub kling: KlingClient,
    /// Client used to fetch generated videos for thumbnails and ingestion.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = prodreel_db::create_pool(&config.database_url).await?;
        prodreel_db::run_migrations(&db).await?;

        let kling = KlingClient::new(KlingConfig::from_env()?)?;

        let http = reqwest::Client::builder().timeout(MEDIA_TIMEOUT).build()?;

        Ok(Self {
            config,
            db,
            kling,
            http,
        })
    }
}
