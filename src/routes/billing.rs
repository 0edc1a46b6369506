// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Billing routes: checkout session creation and the Stripe webhook.
//!
//! The webhook is the ONLY write path for the premium entitlement fields.
//! Client-facing routes never touch them.

use crate::error::{AppError, Result};
use crate::services::billing::{event_types, ChargeObject, CheckoutSessionObject, StripeEvent};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::ValidateEmail;

/// Billing routes. Both are public: checkout carries the uid in the body
/// (frontend contract) and the webhook authenticates via its signature.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/checkout-session", post(create_checkout_session))
        .route("/webhook/stripe", post(handle_event))
}

// ─── Checkout Session ────────────────────────────────────────

#[derive(Serialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
}

/// Create a checkout session and return the redirect URL.
async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CheckoutSessionResponse>> {
    let uid = payload
        .get("userId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing userId".to_string()))?;

    let email = payload
        .get("userEmail")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(email) = email {
        if !email.validate_email() {
            return Err(AppError::BadRequest("Invalid userEmail".to_string()));
        }
    }

    let url = state
        .billing
        .create_checkout_session(uid, email, &state.config.frontend_url)
        .await?;

    tracing::info!(uid = %uid, "Checkout session created");

    Ok(Json(CheckoutSessionResponse { url }))
}

// ─── Webhook ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Handle incoming Stripe webhook events (POST).
///
/// Nothing is read from the payload before the signature verifies. After
/// that, every interpreted event (including no-ops) returns 200 so the
/// processor stops redelivering; only store failures return 500, which
/// asks the processor to retry.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::SignatureInvalid)?;

    state.billing.verify_webhook_signature(
        &body,
        signature,
        chrono::Utc::now().timestamp(),
    )?;

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            // Signed but unparseable: rejecting would only cause a
            // redelivery storm for a payload that will never parse.
            tracing::error!(error = %e, "Failed to parse webhook event");
            return Ok(Json(WebhookAck { received: true }));
        }
    };

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Webhook event verified"
    );

    match event.event_type.as_str() {
        event_types::CHECKOUT_COMPLETED => {
            apply_checkout_completed(&state, event.data.object).await?;
        }
        event_types::CHECKOUT_EXPIRED => {
            // Reserved for a future reminder flow
            tracing::debug!(event_id = %event.id, "Checkout session expired");
        }
        event_types::CHARGE_REFUNDED => {
            apply_refund(&state, event.data.object).await?;
        }
        event_types::PAYMENT_FAILED => {
            // Retry UI is the payment processor's responsibility
            tracing::info!(event_id = %event.id, "Payment failed");
        }
        other => {
            tracing::debug!(event_type = %other, "Ignoring unhandled event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

/// `unpaid -> premium` on a paid checkout with a usable reference id.
async fn apply_checkout_completed(
    state: &AppState,
    object: serde_json::Value,
) -> Result<()> {
    let session: CheckoutSessionObject = match serde_json::from_value(object) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Malformed checkout session object");
            return Ok(());
        }
    };

    if session.payment_status.as_deref() != Some("paid") {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Checkout completed without payment; ignoring"
        );
        return Ok(());
    }

    let Some(uid) = session.client_reference_id.as_deref() else {
        // The checkout endpoint always sets this; its absence is a caller defect
        tracing::warn!(
            session_id = %session.id,
            "Checkout completed without client_reference_id"
        );
        return Ok(());
    };

    let Some(mut profile) = state.db.get_profile(uid).await? else {
        tracing::warn!(uid = %uid, "Checkout completed for unknown profile");
        return Ok(());
    };

    // Idempotency under redelivery: this session was already applied
    if profile.stripe_session_id.as_deref() == Some(session.id.as_str()) {
        tracing::debug!(
            uid = %uid,
            session_id = %session.id,
            "Checkout already applied (idempotent skip)"
        );
        return Ok(());
    }

    profile.is_premium = true;
    profile.premium_activated_at = Some(now_rfc3339());
    profile.premium_revoked_at = None;
    profile.premium_revoke_reason = None;
    profile.stripe_customer_id = session.customer.clone();
    profile.stripe_session_id = Some(session.id.clone());

    state.db.update_premium_fields(&profile).await?;
    tracing::info!(uid = %uid, session_id = %session.id, "Premium activated");

    Ok(())
}

/// `premium -> unpaid` when a refund resolves to exactly one profile.
async fn apply_refund(state: &AppState, object: serde_json::Value) -> Result<()> {
    let charge: ChargeObject = match serde_json::from_value(object) {
        Ok(charge) => charge,
        Err(e) => {
            tracing::error!(error = %e, "Malformed charge object");
            return Ok(());
        }
    };

    let Some(customer) = charge.customer.as_deref() else {
        tracing::info!(charge_id = %charge.id, "Refund without customer id; ignoring");
        return Ok(());
    };

    let profiles = state.db.find_profiles_by_customer(customer).await?;
    let mut profile = match profiles.len() {
        1 => profiles.into_iter().next().expect("len checked"),
        0 => {
            tracing::info!(customer = %customer, "Refund for unknown customer; ignoring");
            return Ok(());
        }
        _ => {
            tracing::warn!(customer = %customer, "Refund customer id is ambiguous; ignoring");
            return Ok(());
        }
    };

    if !profile.is_premium {
        tracing::debug!(uid = %profile.uid, "Refund for non-premium profile (idempotent skip)");
        return Ok(());
    }

    profile.is_premium = false;
    profile.premium_revoked_at = Some(now_rfc3339());
    profile.premium_revoke_reason = Some("refund".to_string());

    state.db.update_premium_fields(&profile).await?;
    tracing::info!(uid = %profile.uid, charge_id = %charge.id, "Premium revoked");

    Ok(())
}
