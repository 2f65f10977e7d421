//! Groq API request/response types
//!
//! Structs that mirror the OpenAI-compatible chat-completions JSON format.
//! Used to serialize requests and deserialize API responses into typed Rust structs.

use serde::{Deserialize, Serialize};

/// Request structure for the chat-completions endpoint
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    /// Model name (e.g., "llama3-70b-8192")
    pub model: String,
    /// Ordered conversation messages (here always one system + one user)
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0 for deterministic answers)
    pub temperature: f32,
}

/// A single request message
#[derive(Serialize, Debug)]
pub struct ChatMessage {
    /// Message role ("system" or "user")
    pub role: String,
    /// Message text
    pub content: String,
}

/// Top-level chat-completions response
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// List of completion choices from the model
    pub choices: Vec<Choice>,
}

/// A single completion choice
#[derive(Deserialize, Debug)]
pub struct Choice {
    /// The generated message for this choice
    pub message: ResponseMessage,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    #[allow(dead_code)] // Part of API response format, may be used in future
    pub finish_reason: Option<String>,
}

/// The generated message of a completion choice
#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    /// The text content of the message
    pub content: String,
}
