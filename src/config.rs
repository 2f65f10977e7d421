//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Assistant pipeline configuration
    pub assistant: AssistantConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// Assistant pipeline configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Groq API key (empty disables model calls; every call site falls back)
    pub groq_api_key: String,
    /// Groq model name
    pub groq_model: String,
    /// Timeout for generative-model calls (in seconds)
    pub model_timeout_secs: u64,
    /// Embedding service endpoint (OpenAI-compatible /embeddings)
    pub embeddings_url: String,
    /// Embedding service API key
    pub embeddings_api_key: String,
    /// Embedding model name
    pub embeddings_model: String,
    /// Path to the JSON knowledge-passage file (missing file = empty store)
    pub knowledge_path: String,
    /// Google Custom Search API key (empty disables web fallback)
    pub search_api_key: String,
    /// Google Custom Search engine id
    pub search_engine_id: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| {
                    // Default to ~/.babyguard or current directory
                    if let Some(home) = env::var_os("HOME") {
                        format!("{}/.babyguard/chat.db", home.to_string_lossy())
                    } else {
                        ".babyguard/chat.db".to_string()
                    }
                }),
            },
            assistant: AssistantConfig {
                groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
                groq_model: env::var("GROQ_MODEL")
                    .unwrap_or_else(|_| "llama3-70b-8192".to_string()),
                model_timeout_secs: env::var("MODEL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
                embeddings_url: env::var("EMBEDDINGS_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                embeddings_api_key: env::var("EMBEDDINGS_API_KEY").unwrap_or_default(),
                embeddings_model: env::var("EMBEDDINGS_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                knowledge_path: env::var("KNOWLEDGE_PATH")
                    .unwrap_or_else(|_| "knowledge/passages.json".to_string()),
                search_api_key: env::var("SEARCH_API_KEY").unwrap_or_default(),
                search_engine_id: env::var("SEARCH_ENGINE_ID").unwrap_or_default(),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
