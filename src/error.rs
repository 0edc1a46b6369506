// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Missing required configuration: {0}")]
    Unconfigured(&'static str),

    #[error("Upstream service rate limited")]
    UpstreamRateLimited,

    #[error("Upstream service error: {0}")]
    UpstreamUnavailable(String),

    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Unconfigured(what) => {
                // Operator problem, not a caller problem. Detail stays in the logs.
                tracing::error!(missing = %what, "Service misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, "not_configured", None)
            }
            AppError::UpstreamRateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "high_demand",
                Some(
                    "The coach is in high demand right now. Please try again in a moment."
                        .to_string(),
                ),
            ),
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!(error = %msg, "Upstream service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_unavailable",
                    Some("We're having trouble reaching a backing service. Please try again.".to_string()),
                )
            }
            // Single indistinguishable rejection for every signature failure mode.
            AppError::SignatureInvalid => (StatusCode::BAD_REQUEST, "invalid_signature", None),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
