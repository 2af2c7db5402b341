//! Storyplayer API server entry point.

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use storyplayer_api::config::ServerConfig;
use storyplayer_api::error::AppError;
use storyplayer_api::state::AppState;
use storyplayer_api::sweeper::spawn_session_sweeper;
use storyplayer_cache_store::SqliteCacheStore;
use storyplayer_client::{HttpAnalyticsSink, HttpStorySource};
use storyplayer_core::clock::SystemClock;
use storyplayer_core::context::RequestContext;
use storyplayer_playback::application::publisher::{BackgroundAnalyticsSink, DEFAULT_QUEUE_CAPACITY};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting storyplayer API server");

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.cache_database_url)
        .await?;
    let cache_store = SqliteCacheStore::new(pool);
    cache_store.migrate().await?;

    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| AppError::Config(format!("HTTP client could not be built: {e}")))?;
    let request_context = RequestContext::new(config.api_token.clone());
    let source = HttpStorySource::new(client.clone(), config.api_base_url.clone());
    let http_sink =
        HttpAnalyticsSink::new(client, config.api_base_url.clone(), request_context.clone());
    let (sink, _analytics_worker) =
        BackgroundAnalyticsSink::spawn(Arc::new(http_sink), DEFAULT_QUEUE_CAPACITY);

    let session_ttl = chrono::Duration::from_std(config.session_idle_ttl)
        .map_err(|e| AppError::Config(format!("SESSION_IDLE_TTL_SECS is out of range: {e}")))?;
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(source),
        Arc::new(cache_store),
        Arc::new(sink),
        request_context,
        config.mobile_breakpoint,
        session_ttl,
    );
    let _sweeper = spawn_session_sweeper(app_state.clone(), config.session_sweep_interval);

    // TODO: Replace CorsLayer::permissive() with the embedding origins once they are configurable.
    let app = storyplayer_api::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
