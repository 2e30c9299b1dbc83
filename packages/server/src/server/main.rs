// Main entry point for the Basecamp API server

use std::sync::Arc;

use anyhow::{Context, Result};
use basecamp_core::kernel::{HttpAnalyzer, SensAdapter, ServerDeps, SheetsBridgeClient};
use basecamp_core::server::build_app;
use basecamp_core::Config;
use sens::{SensOptions, SensService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,basecamp_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Basecamp Agent API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Wire collaborators
    let store = Arc::new(
        SheetsBridgeClient::new(
            config.sheets_bridge_url.clone(),
            config.sheets_bridge_api_key.clone(),
        )
        .context("Failed to build sheets bridge client")?,
    );
    let sens = Arc::new(SensService::new(SensOptions {
        access_key: config.sens_access_key.clone(),
        secret_key: config.sens_secret_key.clone(),
        service_id: config.sens_service_id.clone(),
        sender: config.sens_sender.clone(),
    }));
    let analyzer = Arc::new(
        HttpAnalyzer::new(config.analyzer_url.clone())
            .context("Failed to build analyzer client")?,
    );

    let deps = Arc::new(ServerDeps::new(
        store,
        Arc::new(SensAdapter::new(sens)),
        analyzer,
    ));

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
