// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use bloom_academy::config::Config;
use bloom_academy::db::FirestoreDb;
use bloom_academy::routes::create_router;
use bloom_academy::services::{BillingService, CoachService};
use bloom_academy::AppState;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let coach = CoachService::new(
        config.anthropic_api_key.clone(),
        config.coach_model.clone(),
    );
    let billing = BillingService::new(
        config.stripe_secret_key.clone(),
        config.stripe_price_id.clone(),
        config.stripe_webhook_secret.clone(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        coach,
        billing,
    });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
/// Callers must check `emulator_available()` first.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db().await;

    let coach = CoachService::new(
        config.anthropic_api_key.clone(),
        config.coach_model.clone(),
    );
    let billing = BillingService::new(
        config.stripe_secret_key.clone(),
        config.stripe_price_id.clone(),
        config.stripe_webhook_secret.clone(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        coach,
        billing,
    });

    (create_router(state.clone()), state)
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    bloom_academy::middleware::auth::create_jwt(uid, signing_key).expect("JWT creation failed")
}

/// Build a `Stripe-Signature` header for a payload, the way the payment
/// processor would.
#[allow(dead_code)]
pub fn sign_webhook(payload: &[u8], timestamp: i64, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}
