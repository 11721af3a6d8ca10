// SPDX-License-Identifier: MIT

//! Questlog API Server
//!
//! Backend for a personal game library and challenge tracker, consuming
//! a hosted data gateway, identity provider, file storage, and an
//! external game-metadata service.

use questlog::{
    config::Config,
    db::GatewayDb,
    services::{IdentityClient, MetadataClient, StorageClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Questlog API");

    // Clients for the hosted backend services
    let db = GatewayDb::new(&config.gateway_url, &config.gateway_api_key);
    let identity = IdentityClient::new(&config.gateway_url, &config.gateway_api_key);
    let storage = StorageClient::new(&config.gateway_url, &config.gateway_api_key);
    tracing::info!(gateway = %config.gateway_url, "Gateway clients initialized");

    let metadata = MetadataClient::new(
        config.metadata_client_id.clone(),
        config.metadata_client_secret.clone(),
    );
    tracing::info!("Metadata service client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity,
        storage,
        metadata,
        sessions: dashmap::DashMap::new(),
    });

    // Build router
    let app = questlog::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("questlog=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
