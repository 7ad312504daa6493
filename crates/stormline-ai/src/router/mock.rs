//! Mock adapter for testing
//!
//! Returns queued responses (or a fixed default), counts invocations, and
//! records the last request so tests can assert on what the router sent.

use super::provider::{Capabilities, ProviderAdapter};
use super::types::ProviderKind;
use crate::completion::{
    ChatRequest, ChatResponse, ChunkStream, ClassifyRequest, ClassifyResult, FinishReason,
    ParseRequest, ParseResult, ResearchRequest, ResearchResult, StreamChunk, TokenUsage,
};
use crate::error::Result;
use crate::message::Message;
use crate::structured;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Content returned when the queue is empty
pub const DEFAULT_MOCK_CONTENT: &str = "mock response";

/// A scriptable adapter that never touches the network
pub struct MockAdapter {
    model: String,
    provider: ProviderKind,
    capabilities: Capabilities,
    responses: Mutex<VecDeque<Result<ChatResponse>>>,
    last_request: Mutex<Option<ChatRequest>>,
    calls: AtomicUsize,
}

impl MockAdapter {
    /// Create a chat + streaming mock registered under `model`
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: ProviderKind::OpenAi,
            capabilities: Capabilities::CHAT | Capabilities::STREAM,
            responses: Mutex::new(VecDeque::new()),
            last_request: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Override the advertised capabilities
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the reported provider family
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Queue a plain-text response
    pub fn push_text(&self, content: impl Into<String>) {
        let response = self.response(content.into());
        self.push(Ok(response));
    }

    /// Queue a full response or an error
    pub fn push(&self, response: Result<ChatResponse>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    /// Number of adapter operations invoked so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent chat request received
    #[must_use]
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn response(&self, content: String) -> ChatResponse {
        ChatResponse {
            id: format!("mock-{}", self.call_count()),
            message: Message::assistant(content),
            usage: TokenUsage::default(),
            model: self.model.clone(),
            finish_reason: FinishReason::Stop,
        }
    }

    fn next(&self, request: Option<ChatRequest>) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.is_some() {
            *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = request;
        }
        let queued = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        queued.unwrap_or_else(|| Ok(self.response(DEFAULT_MOCK_CONTENT.to_string())))
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.next(Some(request))
    }

    /// Streams the next queued response word by word
    fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        if !self.supports(Capabilities::STREAM) {
            return Err(self.unsupported(Capabilities::STREAM));
        }
        let response = self.next(Some(request))?;

        let mut chunks: Vec<Result<StreamChunk>> = response
            .content()
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::text(response.id.clone(), word)))
            .collect();
        chunks.push(Ok(StreamChunk {
            id: response.id.clone(),
            delta: String::new(),
            tool_calls: response.tool_calls().to_vec(),
            finish_reason: Some(response.finish_reason),
        }));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn research(&self, request: ResearchRequest) -> Result<ResearchResult> {
        if !self.supports(Capabilities::RESEARCH) {
            return Err(self.unsupported(Capabilities::RESEARCH));
        }
        let answer = self.next(None)?.message.content;
        let citations = structured::extract_citations(&answer, &[], &[]);
        tracing::debug!(query = %request.query, "Mock research");
        Ok(ResearchResult { answer, citations })
    }

    async fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResult> {
        if !self.supports(Capabilities::CLASSIFY) {
            return Err(self.unsupported(Capabilities::CLASSIFY));
        }
        let response = self.next(None)?;
        Ok(structured::parse_classification(
            response.content(),
            &request.categories,
        ))
    }

    async fn parse(&self, _request: ParseRequest) -> Result<ParseResult> {
        if !self.supports(Capabilities::PARSE) {
            return Err(self.unsupported(Capabilities::PARSE));
        }
        let response = self.next(None)?;
        Ok(structured::parse_structured(response.content()))
    }
}
