//! Tally server binary.

use tally_db::{Database, DbConfig};
use tally_server::{build_router, AppState, JwtManager, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Tally server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        addr = %config.socket_addr(),
        db_path = %config.db_path,
        "Configuration loaded"
    );

    // Open database (runs migrations)
    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    info!("Database ready");

    let jwt = JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs);
    let app = build_router(AppState::new(db.clone(), jwt));

    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!(addr = %config.socket_addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
