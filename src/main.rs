use name_analyzer::config::Config;
use name_analyzer::db::Database;
use name_analyzer::db_storage::PersonStorage;
use name_analyzer::enrichment::Enricher;
use name_analyzer::handlers::AppState;
use name_analyzer::person_service::PersonService;
use name_analyzer::routes::{build_router, rate_limited_person_routes};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database, the lookup clients and
/// the HTTP routes (rate limiting, tracing, CORS), then serves until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env has to be loaded before the filter reads LOG_LEVEL
    dotenvy::dotenv().ok();

    // RUST_LOG wins over LOG_LEVEL
    let default_filter = std::env::var("LOG_LEVEL")
        .ok()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| "name_analyzer=debug,tower_http=debug".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    db.ensure_schema().await?;
    tracing::info!("Database connection pool established");

    let enricher = Enricher::from_config(&config)?;
    tracing::info!(
        "✓ Lookup clients initialized (timeout {:?})",
        config.lookup_timeout
    );

    let store = Arc::new(PersonStorage::new(db.pool.clone()));
    let app_state = Arc::new(AppState {
        service: PersonService::new(store, enricher),
        config: config.clone(),
    });

    // Health check and docs bypass rate limiting
    let api = rate_limited_person_routes(config.rate_limit)?;
    let app = build_router(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
