// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stripe client for checkout sessions and webhook signature verification.
//!
//! Handles:
//! - Checkout session creation (the redirect target for premium purchase)
//! - Webhook signature verification (HMAC-SHA256 over the raw body)
//!
//! Entitlement state transitions driven by verified events live in the
//! webhook route handler.

use crate::error::AppError;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the signature timestamp and now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;
/// Per-call timeout for Stripe API requests.
const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Webhook event types we interpret. Everything else is a logged no-op.
pub mod event_types {
    pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
    pub const CHECKOUT_EXPIRED: &str = "checkout.session.expired";
    pub const CHARGE_REFUNDED: &str = "charge.refunded";
    pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";
}

/// Stripe API client.
#[derive(Clone)]
pub struct BillingService {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    price_id: String,
    webhook_secret: String,
}

impl BillingService {
    /// Create a new billing client with API credentials.
    pub fn new(secret_key: String, price_id: String, webhook_secret: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: "https://api.stripe.com".to_string(),
            secret_key,
            price_id,
            webhook_secret,
        }
    }

    /// Create a checkout session and return its redirect URL.
    ///
    /// `client_reference_id` carries the uid so the completed-checkout
    /// webhook can find the profile to activate. `customer_creation` is
    /// forced so a customer id exists for later refund resolution.
    pub async fn create_checkout_session(
        &self,
        uid: &str,
        email: Option<&str>,
        frontend_url: &str,
    ) -> Result<String, AppError> {
        if self.secret_key.is_empty() {
            return Err(AppError::Unconfigured("STRIPE_SECRET_KEY"));
        }

        let url = format!("{}/v1/checkout/sessions", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("client_reference_id", uid.to_string()),
            ("customer_creation", "always".to_string()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "success_url",
                format!("{}/profile?checkout=success", frontend_url),
            ),
            (
                "cancel_url",
                format!("{}/profile?checkout=cancelled", frontend_url),
            ),
        ];
        if let Some(email) = email {
            params.push(("customer_email", email.to_string()));
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("Checkout session request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let session: CheckoutSessionResponse = response.json().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("JSON parse error: {}", e))
        })?;

        session.url.ok_or_else(|| {
            AppError::UpstreamUnavailable("Checkout session has no redirect URL".to_string())
        })
    }

    /// Verify a webhook signature header against the raw request body.
    ///
    /// Header format: `t=<unix>,v1=<hex>[,v1=<hex>...]`. The signed
    /// payload is `"{t}.{body}"`. Every failure mode collapses into the
    /// same `SignatureInvalid` so callers cannot learn which part failed.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), AppError> {
        if self.webhook_secret.is_empty() {
            return Err(AppError::Unconfigured("STRIPE_WEBHOOK_SECRET"));
        }

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {} // Unknown schemes are ignored, not errors
            }
        }

        let timestamp = timestamp.ok_or(AppError::SignatureInvalid)?;
        if candidates.is_empty() {
            return Err(AppError::SignatureInvalid);
        }

        // Stale or future-dated signatures are replays or clock problems
        if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(AppError::SignatureInvalid);
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::SignatureInvalid)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        for candidate in candidates {
            let Ok(decoded) = hex::decode(candidate) else {
                continue;
            };
            if decoded.len() == expected.len()
                && bool::from(decoded.as_slice().ct_eq(expected.as_slice()))
            {
                return Ok(());
            }
        }

        Err(AppError::SignatureInvalid)
    }
}

/// Checkout session creation response (the fields we consume).
#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    #[serde(default)]
    url: Option<String>,
}

// ─── Webhook event payloads ──────────────────────────────────────

/// Envelope of a Stripe webhook event.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Type depends on event_type; parsed per-event by the handler.
    pub object: serde_json::Value,
}

/// `checkout.session.*` event object.
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

/// `charge.refunded` event object.
#[derive(Debug, Deserialize)]
pub struct ChargeObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    fn service() -> BillingService {
        BillingService::new(
            "sk_test_dummy".to_string(),
            "price_test".to_string(),
            SECRET.to_string(),
        )
    }

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature_success() {
        let billing = service();
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let header = sign(payload, NOW, SECRET);

        assert!(billing
            .verify_webhook_signature(payload, &header, NOW)
            .is_ok());
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let billing = service();
        let payload = b"{}";
        let header = sign(payload, NOW, "whsec_other_secret");

        assert!(billing
            .verify_webhook_signature(payload, &header, NOW)
            .is_err());
    }

    #[test]
    fn test_verify_signature_tampered_payload() {
        let billing = service();
        let header = sign(b"{\"amount\":100}", NOW, SECRET);

        assert!(billing
            .verify_webhook_signature(b"{\"amount\":999}", &header, NOW)
            .is_err());
    }

    #[test]
    fn test_verify_signature_stale_timestamp() {
        let billing = service();
        let payload = b"{}";
        let header = sign(payload, NOW - SIGNATURE_TOLERANCE_SECS - 1, SECRET);

        assert!(billing
            .verify_webhook_signature(payload, &header, NOW)
            .is_err());
    }

    #[test]
    fn test_verify_signature_malformed_header() {
        let billing = service();
        let payload = b"{}";

        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000", "garbage"] {
            assert!(
                billing
                    .verify_webhook_signature(payload, header, NOW)
                    .is_err(),
                "header {:?} should fail",
                header
            );
        }
    }

    #[test]
    fn test_verify_signature_accepts_any_matching_v1() {
        let billing = service();
        let payload = b"{}";
        let good = sign(payload, NOW, SECRET);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "ab".repeat(32), good_sig);

        assert!(billing
            .verify_webhook_signature(payload, &header, NOW)
            .is_ok());
    }
}
