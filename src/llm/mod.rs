//! Generative-model client
//!
//! Direct HTTP client for the Groq chat-completions API (OpenAI-compatible).
//! Every invocation in this codebase is a single system + user message pair.

pub mod client;
pub mod types;

pub use client::GroqClient;
