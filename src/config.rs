//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory. In production
//! (Cloud Run) secrets arrive as env vars via secret bindings, so no
//! Secret Manager round-trips are needed at runtime.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and checkout redirects
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Anthropic model used by the coach
    pub coach_model: String,
    /// Stripe price ID for the premium one-time purchase
    pub stripe_price_id: String,

    // --- Secrets (cached from env) ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Anthropic API key for the coach relay
    pub anthropic_api_key: String,
    /// Stripe secret key for checkout session creation
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Shared beta access code (soft gate, not proof of payment)
    pub beta_access_code: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, secrets can be set via a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            // Non-sensitive config from env
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            coach_model: env::var("COACH_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            stripe_price_id: env::var("STRIPE_PRICE_ID")
                .map_err(|_| ConfigError::Missing("STRIPE_PRICE_ID"))?,

            // Secrets - injected as env vars by Cloud Run secret bindings
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ANTHROPIC_API_KEY"))?,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?,
            beta_access_code: env::var("BETA_ACCESS_CODE")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BETA_ACCESS_CODE"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            coach_model: "claude-sonnet-4-20250514".to_string(),
            stripe_price_id: "price_test_premium".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            anthropic_api_key: "test_anthropic_key".to_string(),
            stripe_secret_key: "sk_test_dummy".to_string(),
            stripe_webhook_secret: "whsec_test_secret".to_string(),
            beta_access_code: "test_beta_code".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
