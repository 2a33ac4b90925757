mod config;
mod error;
mod http;
mod models;
mod radarr;
mod ratelimit;
mod sync;
mod tmdb;

use anyhow::{Context, Result};
use config::Configuration;
use http::HttpClient;
use radarr::RadarrClient;
use ratelimit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use sync::SyncRunner;
use tmdb::TmdbClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

// TMDB documents 40 calls / 10s for the detail endpoint, but that limit
// trips in practice; 5 / 15s holds up.
const TMDB_DETAIL_QUOTA: (usize, Duration) = (5, Duration::from_secs(15));
// Keeps the add fan-out from overwhelming Radarr.
const RADARR_ADD_QUOTA: (usize, Duration) = (10, Duration::from_secs(60));

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting listarr v{}", env!("CARGO_PKG_VERSION"));

    let config = Configuration::from_env().context("invalid configuration")?;
    info!("Configuration loaded from environment");

    let http_client = HttpClient::new();

    let (calls, window) = TMDB_DETAIL_QUOTA;
    let tmdb_client = TmdbClient::new(
        http_client.clone(),
        config.tmdb.clone(),
        Arc::new(RateLimiter::new(calls, window)),
    );

    let (calls, window) = RADARR_ADD_QUOTA;
    let radarr_client = RadarrClient::new(
        http_client,
        config.radarr.clone(),
        Arc::new(RateLimiter::new(calls, window)),
    );

    SyncRunner::new(tmdb_client, radarr_client, config.sync_interval)
        .run()
        .await;

    Ok(())
}
