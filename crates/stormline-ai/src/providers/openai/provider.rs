use super::convert::{convert_messages_single_system, convert_tool, parse_response};
use super::stream::OpenAiStreamParser;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, OpenAiConfig, ResponseFormat};
use crate::completion::{
    ChatRequest, ChatResponse, ChunkStream, ClassifyRequest, ClassifyResult, ParseRequest,
    ParseResult,
};
use crate::error::Result;
use crate::providers::transport::{build_client, send_json, sse_stream};
use crate::router::{Capabilities, ProviderAdapter, ProviderKind};
use crate::structured;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, instrument};

/// Bearer-authenticated `/chat/completions` endpoint.
///
/// Shared by every provider that speaks the OpenAI wire format.
#[derive(Clone)]
pub(crate) struct ChatCompletionsClient {
    pub provider: ProviderKind,
    pub client: Client,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ChatCompletionsClient {
    pub(crate) fn post(&self, body: &ChatCompletionRequest) -> RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = %self.provider, model = %body.model, "Sending request to {}", url);

        self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
    }

    pub(crate) async fn complete(&self, body: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        send_json(self.provider, self.post(body), self.timeout).await
    }

    pub(crate) fn stream(&self, body: &ChatCompletionRequest) -> ChunkStream {
        sse_stream(
            self.provider,
            self.post(body),
            OpenAiStreamParser::new(),
            self.timeout,
        )
    }
}

/// Build a Chat Completions body from a uniform request
pub(crate) fn completion_body(
    model: &str,
    request: &ChatRequest,
    default_max_tokens: Option<u32>,
    stream: bool,
) -> ChatCompletionRequest {
    let tools = (!request.tools.is_empty())
        .then(|| request.tools.iter().map(convert_tool).collect());

    ChatCompletionRequest {
        model: model.to_string(),
        messages: convert_messages_single_system(&request.messages),
        max_tokens: request.max_tokens.or(default_max_tokens),
        temperature: request.temperature,
        tools,
        response_format: request.json_output.then(ResponseFormat::json_object),
        search_recency_filter: None,
        stream,
    }
}

/// OpenAI Chat Completions adapter
pub struct OpenAiProvider {
    pub(crate) inner: ChatCompletionsClient,
    pub(crate) config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Creates a new provider
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        Ok(Self::with_client(build_client()?, config))
    }

    /// Creates a provider reusing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: OpenAiConfig) -> Self {
        let inner = ChatCompletionsClient {
            provider: ProviderKind::OpenAi,
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        };
        Self { inner, config }
    }

    /// Creates a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn body(&self, request: &ChatRequest, stream: bool) -> ChatCompletionRequest {
        completion_body(&self.config.model, request, self.config.default_max_tokens, stream)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CHAT
            | Capabilities::STREAM
            | Capabilities::TOOLS
            | Capabilities::CLASSIFY
            | Capabilities::PARSE
            | Capabilities::VISION
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, tools = request.tools.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let response = self.inner.complete(&self.body(&request, false)).await?;
        parse_response(response)
    }

    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        Ok(self.inner.stream(&self.body(&request, true)))
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, categories = request.categories.len()))]
    async fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResult> {
        let chat = structured::classify_chat_request(&request);
        let response = self.chat(chat).await?;
        Ok(structured::parse_classification(
            response.content(),
            &request.categories,
        ))
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn parse(&self, request: ParseRequest) -> Result<ParseResult> {
        let chat = structured::parse_chat_request(&request);
        let response = self.chat(chat).await?;
        Ok(structured::parse_structured(response.content()))
    }
}
