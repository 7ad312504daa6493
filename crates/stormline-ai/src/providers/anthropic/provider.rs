use super::convert::{convert_messages, convert_tool, parse_response};
use super::stream::AnthropicStreamParser;
use super::types::{AnthropicConfig, AnthropicRequest, AnthropicResponse, API_VERSION};
use crate::completion::{ChatRequest, ChatResponse, ChunkStream};
use crate::error::Result;
use crate::providers::transport::{build_client, send_json, sse_stream};
use crate::router::{Capabilities, ProviderAdapter, ProviderKind};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

/// Anthropic Claude adapter
pub struct AnthropicProvider {
    pub(crate) client: Client,
    pub(crate) config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        Ok(Self::with_client(build_client()?, config))
    }

    /// Create a provider reusing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: AnthropicConfig) -> Self {
        Self { client, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> AnthropicRequest {
        let (system, messages) = convert_messages(&request.messages);
        let tools = (!request.tools.is_empty())
            .then(|| request.tools.iter().map(convert_tool).collect());

        AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
            system,
            messages,
            temperature: request.temperature,
            tools,
            stream,
        }
    }

    pub(crate) fn post(&self, body: &impl serde::Serialize) -> RequestBuilder {
        let url = format!("{}/v1/messages", self.config.base_url);
        debug!("Sending request to Anthropic: {}", url);

        self.client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CHAT | Capabilities::STREAM | Capabilities::TOOLS | Capabilities::VISION
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, tools = request.tools.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_request(&request, false);
        let response: AnthropicResponse =
            send_json(ProviderKind::Anthropic, self.post(&body), self.config.timeout).await?;
        Ok(parse_response(response))
    }

    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        let body = self.build_request(&request, true);
        Ok(sse_stream(
            ProviderKind::Anthropic,
            self.post(&body),
            AnthropicStreamParser::new(),
            self.config.timeout,
        ))
    }
}
