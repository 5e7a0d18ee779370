//! Airsight - a city air quality dashboard service.
//!
//! # API Endpoints
//!
//! - `GET /api/aqi?city=` or `?lat=&lon=` - Current enriched AQI
//! - `GET /api/aqi/history?city=&hours=` - Historical records and trend
//! - `POST /api/health` - Health interpretation for an AQI value
//! - `GET /api/cities?q=` - City search
//! - `DELETE /api/cache` - Administrative cache clear
//! - `GET /health` - Health check
//!
//! # Configuration
//!
//! - `AIRSIGHT_PORT` (default 3000)
//! - `AIRSIGHT_DATABASE_URL` (default `sqlite:airsight.db?mode=rwc`)
//! - `AIRSIGHT_PROVIDER` - `open-meteo` (default, no key) or `openweather`
//! - `OPENWEATHER_API_KEY` - required for the `openweather` provider
//! - `AIRSIGHT_CACHE_TTL` - cache TTL in seconds (default 3600)
//! - `AIRSIGHT_CACHE_ENABLED` - set to `false` to bypass the cache

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use airsight::api::{AppState, router};
use airsight::cache::Cache;
use airsight::providers::{OpenMeteoClient, OpenWeatherClient, Provider};
use airsight::service::{AqiService, CachePolicy};
use airsight::storage::Storage;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:airsight.db?mode=rwc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("airsight=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("AIRSIGHT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url = env::var("AIRSIGHT_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let cache_ttl: i64 = env::var("AIRSIGHT_CACHE_TTL")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(3600);

    let cache_enabled = env::var("AIRSIGHT_CACHE_ENABLED")
        .map(|v| v != "false")
        .unwrap_or(true);

    let provider = match env::var("AIRSIGHT_PROVIDER").as_deref() {
        Ok("openweather") => {
            let api_key = env::var("OPENWEATHER_API_KEY").ok();
            if api_key.is_none() {
                // The service starts anyway; requests surface a clear
                // unconfigured error until the key is provided.
                tracing::warn!("OPENWEATHER_API_KEY is not set, openweather requests will fail");
            }
            Provider::OpenWeather(OpenWeatherClient::new(api_key))
        }
        _ => Provider::OpenMeteo(OpenMeteoClient::new()),
    };

    info!(
        port,
        db_url = %db_url,
        provider = provider.name(),
        cache_ttl,
        cache_enabled,
        "Starting Airsight server"
    );

    // Initialize storage and cache
    let storage = Storage::new(&db_url).await?;
    let cache = Cache::new(&db_url).await?;
    info!("Database initialized");

    let service = AqiService::new(
        provider,
        storage,
        cache,
        CachePolicy {
            enabled: cache_enabled,
            ttl_seconds: cache_ttl,
        },
    );

    // Build router
    let app = router(AppState { service }).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Airsight is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
