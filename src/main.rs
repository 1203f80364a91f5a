//! # Quiz Admin Gate
//!
//! Edge service for the quiz-show admin console.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and identity provider client
//! - HTTP server with the route guard

use anyhow::Result;
use tracing::info;

use quiz_admin_gate::config::Settings;
use quiz_admin_gate::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    quiz_admin_gate::telemetry::init_tracing();

    info!("Starting Quiz Admin Gate...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
