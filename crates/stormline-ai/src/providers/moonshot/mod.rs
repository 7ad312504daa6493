//! Moonshot AI - Kimi long-context adapter
//!
//! Speaks the OpenAI Chat Completions wire format against Moonshot's
//! endpoint. Used for summarization, where inputs are large and answers long.
//!
//! API Documentation: https://platform.moonshot.ai/docs

use crate::completion::{ChatRequest, ChatResponse, ChunkStream};
use crate::error::{Error, Result};
use crate::providers::openai::convert::parse_response;
use crate::providers::openai::provider::{completion_body, ChatCompletionsClient};
use crate::providers::transport::build_client;
use crate::router::{Capabilities, ProviderAdapter, ProviderKind};
use crate::util::{env_non_empty, mask_api_key};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Moonshot AI API base URL
pub const BASE_URL: &str = "https://api.moonshot.ai/v1";

/// Available Kimi models
pub const MODELS: &[&str] = &["kimi-k2-0905-preview", "kimi-k2-turbo-preview", "moonshot-v1-128k"];

/// Default model
pub const DEFAULT_MODEL: &str = "kimi-k2-0905-preview";

/// Moonshot AI provider configuration
#[derive(Clone)]
pub struct MoonshotConfig {
    /// API key from Moonshot AI platform
    pub api_key: String,
    /// Base URL (optional, defaults to official API)
    pub base_url: String,
    /// Model this adapter serves
    pub model: String,
    /// Default max tokens; long summaries need more room than chat
    pub default_max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for MoonshotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoonshotConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MoonshotConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            default_max_tokens: 8192,
            timeout: Duration::from_secs(180),
        }
    }

    /// Create configuration from `MOONSHOT_API_KEY` and `MOONSHOT_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = env_non_empty("MOONSHOT_API_KEY")
            .ok_or_else(|| Error::NotConfigured("MOONSHOT_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = env_non_empty("MOONSHOT_BASE_URL") {
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
        self.default_max_tokens = max_tokens;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Moonshot AI adapter
pub struct MoonshotProvider {
    inner: ChatCompletionsClient,
    config: MoonshotConfig,
}

impl MoonshotProvider {
    /// Create a new Moonshot AI provider
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: MoonshotConfig) -> Result<Self> {
        Ok(Self::with_client(build_client()?, config))
    }

    /// Create a provider reusing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: MoonshotConfig) -> Self {
        let inner = ChatCompletionsClient {
            provider: ProviderKind::Moonshot,
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        };
        Self { inner, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(MoonshotConfig::from_env()?)
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &MoonshotConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MoonshotProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Moonshot
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CHAT | Capabilities::STREAM | Capabilities::TOOLS
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, tools = request.tools.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = completion_body(
            &self.config.model,
            &request,
            Some(self.config.default_max_tokens),
            false,
        );
        parse_response(self.inner.complete(&body).await?)
    }

    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        let body = completion_body(
            &self.config.model,
            &request,
            Some(self.config.default_max_tokens),
            true,
        );
        Ok(self.inner.stream(&body))
    }
}
