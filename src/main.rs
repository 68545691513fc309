use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamebase::{open_database, routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamebase=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gamebase server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Open database and run migrations
    let pool = open_database(&config.database_url).await?;

    let state = AppState::new(pool, config.clone());
    let app = routes::router(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
