//! Chat message log model.

use serde::{Deserialize, Serialize};

/// Who authored a message in the coach conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry in a user's append-only conversation log.
///
/// Stored flat in the `messages` collection with the owning uid, queried
/// by uid ordered by `created_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message ID (also the document ID)
    pub id: String,
    /// Owning user
    pub uid: String,
    pub role: MessageRole,
    pub content: String,
    /// Creation time (RFC3339) - the log's ordering key
    pub created_at: String,
}

impl ChatMessage {
    pub fn new(uid: &str, role: MessageRole, content: &str, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            uid: uid.to_string(),
            role,
            content: content.to_string(),
            created_at: now.to_string(),
        }
    }
}
