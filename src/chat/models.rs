//! Chat data models
//!
//! Defines structures for chat sessions and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the assistant/AI
    Assistant,
}

impl MessageRole {
    /// Convert the role to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl From<&str> for MessageRole {
    fn from(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

/// A chat session between one user and the assistant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatSession {
    /// Opaque session token (uuid v4 unless caller-supplied)
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Topic label (defaults to "New chat" until named)
    pub topic: String,
    /// Conversation summary, set when the session is ended
    pub summary: Option<String>,
    /// When the session was started (Unix timestamp)
    pub start_time: i64,
    /// When the session was ended (Unix timestamp); None while active
    pub end_time: Option<i64>,
}

impl ChatSession {
    /// Create a new active session with the default topic
    pub fn new(id: String, user_id: i64) -> Self {
        Self {
            id,
            user_id,
            topic: crate::chat::DEFAULT_TOPIC.to_string(),
            summary: None,
            start_time: Utc::now().timestamp(),
            end_time: None,
        }
    }

    /// Whether the session has been ended and not reactivated since
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A single message in a chat session
///
/// Immutable once created; ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique identifier for the message
    pub id: String,
    /// ID of the session this message belongs to
    pub session_id: String,
    /// Sender role, stored as "user" or "assistant"
    pub sender: String,
    /// Content of the message
    pub content: String,
    /// When the message was created (Unix timestamp)
    pub created_at: i64,
}

impl Message {
    /// Create a new message
    pub fn new(id: String, session_id: String, role: MessageRole, content: String) -> Self {
        Self {
            id,
            session_id,
            sender: role.as_str().to_string(),
            content,
            created_at: Utc::now().timestamp(),
        }
    }

    /// Get the sender role as enum
    pub fn role(&self) -> MessageRole {
        MessageRole::from(self.sender.as_str())
    }

    /// Get created_at as DateTime
    #[allow(dead_code)]
    pub fn created_at_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_else(Utc::now)
    }
}
