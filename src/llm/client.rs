//! Groq API client
//!
//! Direct HTTP client for calling the Groq chat-completions API.
//! Each call sends one system + user message pair and returns the reply text.

use crate::error::AppError;
use crate::llm::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use std::time::Duration;

const GROQ_API_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Client for the Groq chat-completions API
///
/// Holds a pooled `reqwest::Client` with a bounded request timeout so a slow
/// model call cannot hang a chat request indefinitely.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `api_key` - Groq API key
    /// * `model` - Model name (e.g., "llama3-70b-8192")
    /// * `timeout_secs` - Per-request timeout in seconds
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url: GROQ_API_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (for testing against a mock server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Send one system + user message pair and return the reply text
    ///
    /// # Returns
    /// * `Ok(String)` - The text content of the first completion choice
    /// * `Err(AppError)` - If the API key is missing, the HTTP request fails,
    ///   the response cannot be parsed, or the response contains no content
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Model("API key is empty".to_string()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
        };

        tracing::debug!(
            model = %self.model,
            system_len = system.len(),
            user_len = user.len(),
            "Calling Groq API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Model(format!("Failed to send HTTP request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Groq API returned error status"
            );

            return Err(AppError::Model(format!(
                "Groq API returned error status {}: {}",
                status_code, error_body
            )));
        }

        let response_body = response
            .text()
            .await
            .map_err(|e| AppError::Model(format!("Failed to read response body: {}", e)))?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body).map_err(|e| {
            AppError::Model(format!(
                "Failed to parse JSON response: {} - Response body: {}",
                e, response_body
            ))
        })?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| AppError::Model("Groq API response contains no choices".to_string()))?;

        let text = choice.message.content.trim();
        if text.is_empty() {
            return Err(AppError::Model("Groq API response text is empty".to_string()));
        }

        tracing::debug!(response_len = text.len(), "Received response from Groq API");

        Ok(text.to_string())
    }

    /// Model name this client was configured with
    pub fn model(&self) -> &str {
        &self.model
    }
}
