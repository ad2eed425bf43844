use anyhow::Result;
use qr_session_store::{SessionRegistry, Sweeper};
use qr_upload_server::{config::Settings, logging, AppState};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logger()?;

    info!("Starting QR upload server...");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let registry = Arc::new(SessionRegistry::new(settings.store_config()));
    let sweeper = Sweeper::new(registry.clone()).spawn();
    info!(
        "Session sweeper running every {}s",
        settings.sessions.sweep_interval_seconds
    );

    let app = qr_upload_server::build_router(AppState::new(registry, settings.clone()));

    let addr = SocketAddr::from((
        settings.server.host.parse::<IpAddr>()?,
        settings.server.port,
    ));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Keep serving; the process can still be killed
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
