//! ToolHub - a directory and review site for AI tools

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolhub::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db,
    services::Services,
    theme::ThemeEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolhub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ToolHub...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache and services
    let cache = create_cache(&config.cache);
    let services = Services::build(pool, cache);
    tracing::info!("Services initialized");

    // Bootstrap the configured admin account
    if let Some(admin) = &config.admin {
        services.users.bootstrap_admin(admin).await?;
    }

    let removed = services.users.cleanup_expired_sessions().await?;
    if removed > 0 {
        tracing::info!("Removed {} expired sessions", removed);
    }

    // Initialize theme engine
    let theme = ThemeEngine::new(&config.theme.path, &config.theme.active)?;
    tracing::info!("Theme '{}' loaded", theme.active());

    let state = AppState {
        services,
        theme: Arc::new(theme),
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
