// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI coach routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChatMessage, MessageRole};
use crate::services::coach::{validate_history, ChatTurn, TokenUsage};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Coach relay route. Identity travels in the body (`userId`), matching
/// the frontend contract, so this is registered outside the JWT layer.
/// Non-POST methods get a 405 from the router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai-coach", post(coach_chat))
}

/// Chat history route (requires authentication via JWT).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/chat/messages", get(list_messages))
}

// ─── Coach Relay ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct CoachResponse {
    pub message: String,
    pub usage: TokenUsage,
}

/// Relay a conversation to the coach model and log the exchange.
///
/// Order of checks is part of the contract: identity first (401 before
/// the upstream API can ever be reached), then history shape (400).
async fn coach_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CoachResponse>> {
    // Identity check before anything else
    let uid = payload
        .get("userId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let messages: Vec<ChatTurn> = payload
        .get("messages")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Malformed messages: {}", e)))?
        .unwrap_or_default();

    validate_history(&messages)?;

    // The final turn is the new user message; log it before the relay so
    // the conversation record survives an upstream failure.
    let Some(user_turn) = messages.last() else {
        return Err(AppError::BadRequest("messages must not be empty".to_string()));
    };
    state
        .db
        .append_message(&ChatMessage::new(
            &uid,
            MessageRole::User,
            &user_turn.content,
            &now_rfc3339(),
        ))
        .await?;

    let reply = state.coach.relay(&messages).await?;

    state
        .db
        .append_message(&ChatMessage::new(
            &uid,
            MessageRole::Assistant,
            &reply.message,
            &now_rfc3339(),
        ))
        .await?;

    tracing::debug!(
        uid = %uid,
        input_tokens = reply.usage.input_tokens,
        output_tokens = reply.usage.output_tokens,
        "Coach reply generated"
    );

    Ok(Json(CoachResponse {
        message: reply.message,
        usage: reply.usage,
    }))
}

// ─── Chat History ────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: String,
}

/// List the caller's conversation log, oldest first.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MessageResponse>>> {
    let messages = state.db.list_messages(&user.uid).await?;

    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageResponse {
                id: m.id,
                role: m.role,
                content: m.content,
                created_at: m.created_at,
            })
            .collect(),
    ))
}
