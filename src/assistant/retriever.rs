//! Knowledge retrieval
//!
//! Similarity search over the locally embedded knowledge passages, followed
//! by a summarize-and-soften pass that turns raw passages into an answer.
//! Nothing in this module raises past its boundary: every failure collapses
//! into the empty-retrieval sentinel so the pipeline can fall back.

use crate::assistant::composer::{Composer, DISCLAIMER};
use crate::embedding::EmbeddingClient;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Number of passages fetched per query
const TOP_K: usize = 3;

/// An embedded knowledge passage
///
/// Externally managed and read-only; vectors are precomputed with the same
/// model the query embedder uses.
#[derive(Debug, Clone, Deserialize)]
pub struct Passage {
    /// Stable passage identifier
    pub id: String,
    /// Passage text
    pub text: String,
    /// Precomputed embedding vector
    pub embedding: Vec<f32>,
}

/// Similarity-searchable store of knowledge passages
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Top-k passages by similarity to the query vector, best first
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<Passage>, AppError>;

    /// Number of passages held
    async fn count(&self) -> usize;
}

/// In-memory cosine-similarity store
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    passages: Vec<Passage>,
}

impl InMemoryKnowledgeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store over the given passages
    pub fn with_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    /// Load passages from a JSON file
    ///
    /// A missing or unparsable file yields an empty store (logged), not an
    /// error: the assistant still answers, it just always falls back.
    pub fn load(path: &str) -> Self {
        if !Path::new(path).exists() {
            tracing::warn!(path = %path, "Knowledge file not found, starting with empty store");
            return Self::new();
        }

        match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str::<Vec<Passage>>(&raw).map_err(Into::into))
        {
            Ok(passages) => {
                tracing::info!(count = passages.len(), path = %path, "Loaded knowledge passages");
                Self::with_passages(passages)
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load knowledge passages");
                Self::new()
            }
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.is_empty() || b.is_empty() || a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<Passage>, AppError> {
        let mut scored: Vec<(f32, &Passage)> = self
            .passages
            .iter()
            .map(|p| (Self::cosine_similarity(query_embedding, &p.embedding), p))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored.into_iter().take(k).map(|(_, p)| p.clone()).collect())
    }

    async fn count(&self) -> usize {
        self.passages.len()
    }
}

/// Outcome of the retrieval stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// A fully formed, disclaimed answer built from local knowledge
    Answer(String),
    /// No relevant local knowledge; the pipeline decides what comes next
    Empty,
}

/// The retrieve-and-summarize stage
#[derive(Clone)]
pub struct KnowledgeRetriever {
    store: Arc<dyn KnowledgeStore>,
    embedder: EmbeddingClient,
    llm: Arc<crate::llm::GroqClient>,
    composer: Composer,
}

impl KnowledgeRetriever {
    /// Create the stage over a store, an embedder, the model client and the composer
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: EmbeddingClient,
        llm: Arc<crate::llm::GroqClient>,
        composer: Composer,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            composer,
        }
    }

    /// Retrieve the top passages for a query and summarize them into an answer
    ///
    /// Returns [`Retrieval::Empty`] when the store is empty, nothing is
    /// found, or any underlying call fails. Never returns an error.
    pub async fn retrieve_and_summarize(&self, query: &str) -> Retrieval {
        if self.store.count().await == 0 {
            return Retrieval::Empty;
        }

        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(error = %e, "Query embedding failed, treating retrieval as empty");
                return Retrieval::Empty;
            }
        };

        let passages = match self.store.search(&query_embedding, TOP_K).await {
            Ok(passages) if !passages.is_empty() => passages,
            Ok(_) => return Retrieval::Empty,
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge search failed, treating retrieval as empty");
                return Retrieval::Empty;
            }
        };

        tracing::debug!(count = passages.len(), "Retrieved knowledge passages");

        let context = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        // Summarize the raw passages, then soften the summary into the
        // assistant's voice and markdown shape.
        let summary_prompt = format!("Write a concise summary of the following:\n\n{}", context);
        let raw_summary = match self
            .llm
            .chat("You are a helpful summarizer.", &summary_prompt)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "Passage summarization failed, treating retrieval as empty");
                return Retrieval::Empty;
            }
        };

        let answer = match self.composer.soften(&raw_summary).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Summary softening failed, treating retrieval as empty");
                return Retrieval::Empty;
            }
        };

        Retrieval::Answer(format!("{}{}", answer, DISCLAIMER))
    }
}
