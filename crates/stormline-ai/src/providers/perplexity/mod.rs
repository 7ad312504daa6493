//! Perplexity - citation-oriented research adapter
//!
//! OpenAI-compatible chat at `https://api.perplexity.ai`. Answers come with a
//! `citations` URL list and, on newer models, structured `search_results`.
//! There is no tool calling.

use crate::completion::{
    ChatRequest, ChatResponse, ChunkStream, Citation, ResearchRequest, ResearchResult,
};
use crate::error::{Error, Result};
use crate::providers::openai::convert::parse_response;
use crate::providers::openai::provider::{completion_body, ChatCompletionsClient};
use crate::providers::openai::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::providers::transport::{build_client, send_json};
use crate::router::{Capabilities, ProviderAdapter, ProviderKind};
use crate::structured;
use crate::util::{env_non_empty, mask_api_key};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Perplexity API base URL
pub const BASE_URL: &str = "https://api.perplexity.ai";

/// Available Sonar models
pub const MODELS: &[&str] = &["sonar-pro", "sonar", "sonar-reasoning-pro"];

/// Default model
pub const DEFAULT_MODEL: &str = "sonar-pro";

/// Perplexity provider configuration
#[derive(Clone)]
pub struct PerplexityConfig {
    /// API key
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Model this adapter serves
    pub model: String,
    /// Default max tokens
    pub default_max_tokens: Option<u32>,
    /// Request timeout; searches run before generation starts
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for PerplexityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerplexityConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PerplexityConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            default_max_tokens: None,
            timeout: Duration::from_secs(90),
        }
    }

    /// Create configuration from `PERPLEXITY_API_KEY` and `PERPLEXITY_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = env_non_empty("PERPLEXITY_API_KEY")
            .ok_or_else(|| Error::NotConfigured("PERPLEXITY_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = env_non_empty("PERPLEXITY_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the default max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = Some(max_tokens);
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PerplexityResponse {
    #[serde(flatten)]
    pub completion: ChatCompletionResponse,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
}

/// Turn a raw Perplexity response into an answer with citations
pub(crate) fn research_result(response: PerplexityResponse) -> Result<ResearchResult> {
    let search_results: Vec<Citation> = response
        .search_results
        .into_iter()
        .map(|r| Citation {
            title: r.title,
            url: r.url,
            snippet: r.snippet,
        })
        .collect();
    let answer = parse_response(response.completion)?.message.content;
    let citations = structured::extract_citations(&answer, &search_results, &response.citations);

    Ok(ResearchResult { answer, citations })
}

/// Perplexity Sonar adapter
pub struct PerplexityProvider {
    inner: ChatCompletionsClient,
    config: PerplexityConfig,
}

impl PerplexityProvider {
    /// Create a new Perplexity provider
    pub fn new(config: PerplexityConfig) -> Result<Self> {
        Ok(Self::with_client(build_client()?, config))
    }

    /// Create a provider reusing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: PerplexityConfig) -> Self {
        let inner = ChatCompletionsClient {
            provider: ProviderKind::Perplexity,
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        };
        Self { inner, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(PerplexityConfig::from_env()?)
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &PerplexityConfig {
        &self.config
    }

    pub(crate) fn body(&self, request: &ChatRequest, stream: bool) -> ChatCompletionRequest {
        if !request.tools.is_empty() {
            debug!(tools = request.tools.len(), "Perplexity has no tool calling, omitting tools");
        }
        let mut body = completion_body(
            &self.config.model,
            request,
            self.config.default_max_tokens,
            stream,
        );
        body.tools = None;
        body.response_format = None;
        body
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for PerplexityProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Perplexity
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CHAT | Capabilities::STREAM | Capabilities::RESEARCH
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        parse_response(self.inner.complete(&self.body(&request, false)).await?)
    }

    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        Ok(self.inner.stream(&self.body(&request, true)))
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, recency = ?request.recency))]
    async fn research(&self, request: ResearchRequest) -> Result<ResearchResult> {
        let mut body = self.body(&structured::research_chat_request(&request), false);
        body.search_recency_filter = request.recency.map(|r| r.as_str());

        let response: PerplexityResponse =
            send_json(ProviderKind::Perplexity, self.inner.post(&body), self.config.timeout).await?;
        let result = research_result(response)?;
        debug!(citations = result.citations.len(), "Research complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests;
