// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI coach relay to the Anthropic Messages API.
//!
//! Handles:
//! - Message history validation (shape, size limits)
//! - Prepending the fixed behavioral policy (system prompt)
//! - Rate limit detection (surfaced as a distinct retry-later condition)
//!
//! The relay is stateless per call and performs no retries; retry policy
//! belongs to the caller.

use crate::error::AppError;
use crate::models::MessageRole;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_REPLY_TOKENS: u32 = 1024;
/// Per-call timeout for the upstream request.
const UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Upper bound on history length forwarded upstream.
pub const MAX_HISTORY_TURNS: usize = 50;
/// Upper bound on a single message's content length.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Returned when the upstream reply carries no text block.
const FALLBACK_REPLY: &str =
    "I'm sorry, I wasn't able to put a reply together just now. Please try asking again.";

/// The fixed behavioral policy sent with every request. Callers cannot
/// see or override it.
const SYSTEM_PROMPT: &str = "\
You are the in-app coach for Bloom Academy, an educational platform about \
intimacy, communication, and sexual wellness for adults. Your role is to \
support learners working through the curriculum with warmth, accuracy, and \
zero judgment.

Guidelines:
- Be supportive and body-positive. Normalize the wide range of human \
experience; never frame any outcome as a goal the user must achieve.
- Ground answers in the kind of evidence-based material the curriculum \
teaches: anatomy, arousal and the nervous system, communication and \
consent, preparation and safety.
- Encourage open communication between partners and always center consent.
- You are an educational companion, not a clinician. Do not diagnose. For \
pain, bleeding, signs of infection, or persistent distress, recommend \
talking to a healthcare provider or licensed therapist.
- Keep replies concise and conversational; a few short paragraphs at most.
- If asked about topics outside intimacy education, gently steer back to \
the curriculum.";

/// One turn of conversation history as accepted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Token accounting reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A generated coach reply.
#[derive(Debug, Clone)]
pub struct CoachReply {
    pub message: String,
    pub usage: TokenUsage,
}

/// Check that a message history is a well-formed conversation.
///
/// The last turn must come from the user, since that is the turn being
/// answered. Unknown roles never reach here; they fail deserialization.
pub fn validate_history(history: &[ChatTurn]) -> Result<(), AppError> {
    if history.is_empty() {
        return Err(AppError::BadRequest("messages must not be empty".to_string()));
    }
    if history.len() > MAX_HISTORY_TURNS {
        return Err(AppError::BadRequest(format!(
            "too many messages (max {})",
            MAX_HISTORY_TURNS
        )));
    }
    for turn in history {
        if turn.content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "message content must not be empty".to_string(),
            ));
        }
        if turn.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "message content too long (max {} characters)",
                MAX_CONTENT_CHARS
            )));
        }
    }
    if history.last().map(|t| t.role) != Some(MessageRole::User) {
        return Err(AppError::BadRequest(
            "last message must be from the user".to_string(),
        ));
    }
    Ok(())
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct CoachService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CoachService {
    /// Create a new coach relay with API credentials.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key,
            model,
        }
    }

    /// Relay a validated history upstream and return the generated reply.
    pub async fn relay(&self, history: &[ChatTurn]) -> Result<CoachReply, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Unconfigured("ANTHROPIC_API_KEY"));
        }

        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_REPLY_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": history,
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Coach request failed: {}", e)))?;

        let reply: MessagesResponse = self.check_response_json(response).await?;

        // Extract the first text block; non-text replies get the apology.
        let message = reply
            .content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.clone())
            .unwrap_or_else(|| {
                tracing::warn!("Coach reply contained no text block");
                FALLBACK_REPLY.to_string()
            });

        Ok(CoachReply {
            message,
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        })
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // 429 = rate limited, 529 = overloaded; both mean "try later"
            if status.as_u16() == 429 || status.as_u16() == 529 {
                tracing::warn!(status = status.as_u16(), "Coach upstream rate limited");
                return Err(AppError::UpstreamRateLimited);
            }

            return Err(AppError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("JSON parse error: {}", e)))
    }
}

/// Messages API response (the fields we consume).
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: MessageRole, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_validate_history_accepts_alternating_turns() {
        let history = vec![
            turn(MessageRole::User, "Where do I start?"),
            turn(MessageRole::Assistant, "Try the anatomy module first."),
            turn(MessageRole::User, "What comes after that?"),
        ];
        assert!(validate_history(&history).is_ok());
    }

    #[test]
    fn test_validate_history_rejects_empty() {
        assert!(validate_history(&[]).is_err());
    }

    #[test]
    fn test_validate_history_rejects_blank_content() {
        let history = vec![turn(MessageRole::User, "   ")];
        assert!(validate_history(&history).is_err());
    }

    #[test]
    fn test_validate_history_rejects_oversized_content() {
        let history = vec![turn(MessageRole::User, &"x".repeat(MAX_CONTENT_CHARS + 1))];
        assert!(validate_history(&history).is_err());
    }

    #[test]
    fn test_validate_history_rejects_assistant_final_turn() {
        let history = vec![
            turn(MessageRole::User, "Hello"),
            turn(MessageRole::Assistant, "Hi there"),
        ];
        assert!(validate_history(&history).is_err());
    }

    #[test]
    fn test_validate_history_rejects_too_many_turns() {
        let mut history: Vec<ChatTurn> = (0..=MAX_HISTORY_TURNS)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                turn(role, "hi")
            })
            .collect();
        // Ensure the final turn is from the user so only length can fail
        history.push(turn(MessageRole::User, "hi"));
        assert!(validate_history(&history).is_err());
    }
}
