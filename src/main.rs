// SPDX-License-Identifier: MIT

//! E-Bike Tracker API Server
//!
//! Tracks mileage for a single e-bike: clients submit partial updates, the
//! accounting engine folds them into a per-day ledger, and records live in
//! Redis with a sliding TTL.

use ebike_tracker::{
    config::Config, services::AccountingEngine, store::RecordStore, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting E-Bike Tracker API");

    // Connect to the record store
    let store = RecordStore::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    // Accounting engine with the configured reference zone and retention
    let accounting = AccountingEngine::new(config.utc_offset_hours, config.retention_months);
    tracing::info!(
        utc_offset_hours = config.utc_offset_hours,
        retention_months = config.retention_months,
        "Accounting engine initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        accounting,
    });

    // Build router
    let app = ebike_tracker::routes::create_router(state);

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
                .add_directive("ebike_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
