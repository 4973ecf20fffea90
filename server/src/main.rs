//! Agora Server - Main Entry Point
//!
//! Serves authorization decisions over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use agora_server::{api, auth::JwtPrincipalResolver, authz::DecisionEngine, config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        operations = agora_server::operations::registry().len(),
        "Starting Agora Server"
    );

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    let store = Arc::new(db::PgStore::new(db_pool));

    // Build application state
    let engine = DecisionEngine::new(Arc::clone(&store), config.engine());
    let principals = Arc::new(JwtPrincipalResolver::new(store, config.jwt_secret.clone()));
    let state = api::AppState::new(engine, principals);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
