//! Web fallback search
//!
//! When local retrieval comes up empty and the lookup decision says the
//! question needs external sources, this stage queries the Google Custom
//! Search JSON API, fetches the top result pages, extracts their leading
//! paragraphs and softens them into snippet context for the composer.

use crate::assistant::composer::Composer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com";

/// Results requested per search
const SEARCH_RESULT_COUNT: usize = 2;

/// Paragraphs extracted per fetched page
const MAX_PARAGRAPHS: usize = 5;

/// Character cap on extracted page text
const MAX_SNIPPET_LEN: usize = 500;

/// Page-fetch timeout; a slow source must not hang the request
const FETCH_TIMEOUT_SECS: u64 = 5;

static PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("paragraph regex is valid")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));

/// Top-level Custom Search response
#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// A single search result
#[derive(Deserialize, Debug)]
struct SearchItem {
    link: String,
}

/// Outcome of the web fallback stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebLookup {
    /// Snippet context assembled from fetched pages
    Found {
        /// Concatenated, softened per-result snippets
        info: String,
        /// Result links, in search order
        sources: Vec<String>,
    },
    /// The search returned nothing usable
    NoResults,
    /// A network or parsing failure; the caller substitutes a fixed reply
    Failed,
}

/// External search + page-fetch stage
#[derive(Clone)]
pub struct WebSearcher {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    base_url: String,
    composer: Composer,
}

impl WebSearcher {
    /// Create the stage
    ///
    /// # Arguments
    /// * `api_key` - Google Custom Search API key (empty disables the stage)
    /// * `engine_id` - Custom Search engine id
    /// * `composer` - Used to soften extracted page text
    pub fn new(api_key: String, engine_id: String, composer: Composer) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            engine_id,
            base_url: GOOGLE_API_BASE_URL.to_string(),
            composer,
        }
    }

    /// Override the API base URL (for testing against a mock server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Whether search credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.engine_id.is_empty()
    }

    /// Search the web for a query and assemble snippet context
    pub async fn lookup(&self, query: &str) -> WebLookup {
        if !self.is_configured() {
            tracing::debug!("Web search not configured, skipping fallback");
            return WebLookup::NoResults;
        }

        let links = match self.search_links(query).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(error = %e, "Web search failed");
                return WebLookup::Failed;
            }
        };

        if links.is_empty() {
            return WebLookup::NoResults;
        }

        let mut snippets = Vec::new();
        for link in &links {
            let page_text = self.fetch_page_content(link).await;
            match self.composer.soften(&page_text).await {
                Ok(snippet) => snippets.push(snippet),
                Err(e) => {
                    tracing::warn!(link = %link, error = %e, "Snippet softening failed");
                    return WebLookup::Failed;
                }
            }
        }

        WebLookup::Found {
            info: snippets.join("\n\n"),
            sources: links,
        }
    }

    async fn search_links(&self, query: &str) -> Result<Vec<String>, reqwest::Error> {
        let url = format!("{}/customsearch/v1", self.base_url);
        let num = SEARCH_RESULT_COUNT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.items.into_iter().map(|item| item.link).collect())
    }

    /// Fetch a page and extract its leading paragraph text
    ///
    /// Extracts up to the first 5 paragraphs capped at 500 characters. Fetch
    /// failures yield an explanatory string rather than an error; the snippet
    /// still flows through softening like any other page text.
    pub async fn fetch_page_content(&self, url: &str) -> String {
        let html = match self.client.get(url).send().await {
            Ok(response) => match response.text().await {
                Ok(html) => html,
                Err(e) => return format!("Could not extract content: {}", e),
            },
            Err(e) => return format!("Could not extract content: {}", e),
        };

        let text = PARAGRAPH_RE
            .captures_iter(&html)
            .take(MAX_PARAGRAPHS)
            .map(|cap| {
                let inner = TAG_RE.replace_all(&cap[1], " ");
                decode_entities(&inner)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let truncated: String = text.chars().take(MAX_SNIPPET_LEN).collect();
        if truncated.is_empty() {
            "No readable content found.".to_string()
        } else {
            truncated
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
