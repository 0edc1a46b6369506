// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bloom Academy API Server
//!
//! Serves the education platform backend: profiles and entitlements,
//! lesson progress, the AI coach relay, and the payment webhook.

use bloom_academy::{
    config::Config,
    db::FirestoreDb,
    services::{BillingService, CoachService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Bloom Academy API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize the coach relay
    let coach = CoachService::new(config.anthropic_api_key.clone(), config.coach_model.clone());
    tracing::info!(model = %config.coach_model, "Coach relay initialized");

    // Initialize the billing client
    let billing = BillingService::new(
        config.stripe_secret_key.clone(),
        config.stripe_price_id.clone(),
        config.stripe_webhook_secret.clone(),
    );
    tracing::info!("Billing client initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        coach,
        billing,
    });

    // Build router
    let app = bloom_academy::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bloom_academy=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
