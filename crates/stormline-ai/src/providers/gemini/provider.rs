use super::convert::{convert_messages, convert_tools, parse_response};
use super::stream::GeminiStreamParser;
use super::types::{GeminiConfig, GeminiRequest, GeminiResponse, GenerationConfig};
use crate::completion::{ChatRequest, ChatResponse, ChunkStream, ParseRequest, ParseResult};
use crate::error::Result;
use crate::providers::transport::{build_client, send_json, sse_stream};
use crate::router::{Capabilities, ProviderAdapter, ProviderKind};
use crate::structured;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

/// Google Gemini adapter
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        Ok(Self::with_client(build_client()?, config))
    }

    /// Create a provider reusing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_request(&self, request: &ChatRequest) -> GeminiRequest {
        let tools = (!request.tools.is_empty()).then(|| convert_tools(&request.tools));

        GeminiRequest {
            contents: convert_messages(&request.messages),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: Some(request.max_tokens.unwrap_or(self.config.default_max_tokens)),
                response_mime_type: request.json_output.then_some("application/json"),
            }),
            tools,
        }
    }

    fn post(&self, method: &str, body: &GeminiRequest) -> RequestBuilder {
        let url = format!("{}/models/{}:{}", self.config.base_url, self.config.model, method);
        debug!("Sending request to Gemini: {}", url);

        self.client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GeminiProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::CHAT
            | Capabilities::STREAM
            | Capabilities::TOOLS
            | Capabilities::PARSE
            | Capabilities::VISION
    }

    #[instrument(skip(self, request), fields(model = %self.config.model, tools = request.tools.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_request(&request);
        let response: GeminiResponse = send_json(
            ProviderKind::Gemini,
            self.post("generateContent", &body),
            self.config.timeout,
        )
        .await?;
        parse_response(response, &self.config.model)
    }

    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        let body = self.build_request(&request);
        Ok(sse_stream(
            ProviderKind::Gemini,
            self.post("streamGenerateContent", &body).query(&[("alt", "sse")]),
            GeminiStreamParser::new(),
            self.config.timeout,
        ))
    }

    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn parse(&self, request: ParseRequest) -> Result<ParseResult> {
        let response = self.chat(structured::parse_chat_request(&request)).await?;
        Ok(structured::parse_structured(response.content()))
    }
}
