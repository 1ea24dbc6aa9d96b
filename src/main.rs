//! ClubPortal server
//!
//! Main application entry point

use anyhow::Context;
use tracing::{error, info, warn};

use ClubPortal::{
    config::Settings,
    database::DatabaseService,
    handlers,
    services::ServiceFactory,
    state::AppState,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration
    dotenv::dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", ClubPortal::info());

    let db = DatabaseService::new(&settings);
    db.initialize().await?;

    let services = ServiceFactory::new(&settings, db.clone())?;
    let health = services.health_check().await;
    if health.is_healthy() {
        info!(
            email_enabled = health.email_enabled,
            qr_enabled = health.qr_enabled,
            "Services initialized"
        );
    } else {
        for issue in health.get_issues() {
            warn!(issue = %issue, "Service health issue at startup");
        }
    }

    let bind_address = settings.server.bind_address.clone();
    let state = AppState::new(settings, db, services).with_session_cleanup();
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(address = %bind_address, "ClubPortal is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("ClubPortal has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
