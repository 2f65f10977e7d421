//! Chat module
//!
//! Handles chat session and message storage using SQLite database.

pub mod db;
pub mod models;

pub use db::ChatDb;
pub use models::{ChatSession, Message, MessageRole};

/// Topic assigned to freshly created sessions, replaced at session end
/// when a better label can be derived from the conversation.
pub const DEFAULT_TOPIC: &str = "New chat";

/// Maximum persisted topic length in characters
pub const MAX_TOPIC_LEN: usize = 100;
