//! Bibliotheca Server - Library Management System
//!
//! REST API server for the library catalog and shop.

use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliotheca_server::{
    api, config::AppConfig, repository::Repository, services::cache::ResponseCache, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bibliotheca_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Bibliotheca Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let options = SqliteConnectOptions::from_str(&config.database.url)
        .context("Invalid database URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    let repository = Repository::new(pool);
    repository
        .migrate()
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let cache = ResponseCache::from_config(&config.cache)
        .await
        .context("Failed to connect to Redis")?;
    if cache.is_enabled() {
        tracing::info!("Response cache enabled");
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState::new(config, repository, cache);
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
