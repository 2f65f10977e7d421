//! Embedding service client
//!
//! HTTP client for an OpenAI-compatible `/embeddings` endpoint. The knowledge
//! store holds passages with precomputed vectors from the same model; this
//! client only embeds incoming queries.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request structure for the embeddings endpoint
#[derive(Serialize, Debug)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

/// Top-level embeddings response
#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// A single embedding result
#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embedding service
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl EmbeddingClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Service base URL (e.g., "https://api.openai.com/v1")
    /// * `api_key` - Service API key
    /// * `model` - Embedding model name (e.g., "text-embedding-3-small")
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url,
        }
    }

    /// Generate an embedding vector for a single text string
    ///
    /// # Returns
    /// * `Ok(Vec<f32>)` - The embedding of the input text
    /// * `Err(AppError)` - If the request fails or the response carries no data
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Embedding("API key is empty".to_string()));
        }

        let url = format!("{}/embeddings", self.base_url);
        let request_body = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send HTTP request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %error_body,
                "Embedding service returned error status"
            );
            return Err(AppError::Embedding(format!(
                "Embedding service returned error status {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("Embedding response contains no data".to_string()))
    }
}
