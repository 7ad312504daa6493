//! AI Router implementation
//!
//! Holds the adapter registry and dispatches each request to the adapter
//! serving its task's preferred model, falling back to the configured
//! fallback model, and emulating research/classify/parse over plain chat
//! when the resolved adapter lacks them.

use super::config::RouterConfig;
use super::provider::{Capabilities, ProviderAdapter};
use super::table::RouteTable;
use super::types::AiTask;
use crate::completion::{
    ChatRequest, ChatResponse, ChunkStream, ClassifyRequest, ClassifyResult, ParseRequest,
    ParseResult, ResearchRequest, ResearchResult,
};
use crate::context::{render_system_prompt, CustomerContext};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::structured;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Task-aware router over a fixed set of provider adapters.
///
/// The registry is filled once at startup and read-only afterwards; share the
/// router behind an `Arc` and call it concurrently without locking.
pub struct AiRouter {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    fallback: Option<Arc<dyn ProviderAdapter>>,
    fallback_model: String,
    routes: RouteTable,
}

impl AiRouter {
    /// Create an empty router
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            adapters: HashMap::new(),
            fallback: None,
            routes: RouteTable::with_overrides(&config.task_models),
            fallback_model: config.fallback_model,
        }
    }

    /// Register an adapter under its model identifier.
    ///
    /// An adapter whose model equals the configured fallback model also
    /// becomes the fallback.
    pub fn register_adapter(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let model = adapter.model_id().to_string();
        debug!(model = %model, provider = %adapter.provider(), "Registering adapter");

        if model == self.fallback_model {
            self.fallback = Some(Arc::clone(&adapter));
        }
        self.adapters.insert(model, adapter);
    }

    /// Resolve the adapter serving a task
    pub fn resolve(&self, task: AiTask) -> Result<Arc<dyn ProviderAdapter>> {
        let preferred = self.routes.model_for(task);
        if let Some(adapter) = self.adapters.get(preferred) {
            return Ok(Arc::clone(adapter));
        }

        match &self.fallback {
            Some(fallback) => {
                warn!(
                    task = %task,
                    model = %preferred,
                    adapter = %fallback.model_id(),
                    "Preferred model not registered, using fallback adapter"
                );
                Ok(Arc::clone(fallback))
            }
            None => Err(Error::NoAdapterAvailable(task.to_string())),
        }
    }

    /// Registered model identifiers, sorted
    #[must_use]
    pub fn registered_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }

    /// Configured fallback model identifier
    #[must_use]
    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    /// Whether an adapter is registered for a model
    #[must_use]
    pub fn has_adapter(&self, model: &str) -> bool {
        self.adapters.contains_key(model)
    }

    /// Task → model table in effect
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Complete a conversation with the adapter for the request's task
    #[instrument(skip(self, request), fields(task = %request.task()))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let adapter = self.resolve(request.task())?;
        adapter.chat(request.with_task_defaults()).await
    }

    /// Stream a conversation with the adapter for the request's task
    pub fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream> {
        let adapter = self.resolve(request.task())?;
        if !adapter.supports(Capabilities::STREAM) {
            return Err(adapter.unsupported(Capabilities::STREAM));
        }

        let mut request = request.with_task_defaults();
        request.stream = true;
        adapter.chat_stream(request)
    }

    /// Prepend a rendered customer context as the system prompt, then chat
    pub async fn chat_with_context(
        &self,
        messages: Vec<Message>,
        context: &CustomerContext,
        task: AiTask,
    ) -> Result<ChatResponse> {
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(Message::system(render_system_prompt(context)));
        conversation.extend(messages);

        self.chat(ChatRequest::new(conversation).with_task(task))
            .await
    }

    /// Research a question, emulated over chat when unsupported
    #[instrument(skip(self, request))]
    pub async fn research(&self, request: ResearchRequest) -> Result<ResearchResult> {
        let adapter = self.resolve(AiTask::Research)?;
        if adapter.supports(Capabilities::RESEARCH) {
            return adapter.research(request).await;
        }

        info!(adapter = %adapter.model_id(), capability = "research", "Emulating capability over chat");
        let response = adapter
            .chat(structured::research_chat_request(&request))
            .await?;
        Ok(ResearchResult {
            answer: response.message.content,
            citations: Vec::new(),
        })
    }

    /// Classify text, emulated over chat when unsupported
    #[instrument(skip(self, request), fields(categories = request.categories.len()))]
    pub async fn classify(&self, request: ClassifyRequest) -> Result<ClassifyResult> {
        let adapter = self.resolve(AiTask::Classify)?;
        if adapter.supports(Capabilities::CLASSIFY) {
            return adapter.classify(request).await;
        }

        info!(adapter = %adapter.model_id(), capability = "classify", "Emulating capability over chat");
        let response = adapter
            .chat(structured::classify_chat_request(&request))
            .await?;
        Ok(structured::parse_classification(
            response.content(),
            &request.categories,
        ))
    }

    /// Extract structured data, emulated over chat when unsupported
    #[instrument(skip(self, request))]
    pub async fn parse(&self, request: ParseRequest) -> Result<ParseResult> {
        let adapter = self.resolve(AiTask::Parse)?;
        if adapter.supports(Capabilities::PARSE) {
            return adapter.parse(request).await;
        }

        info!(adapter = %adapter.model_id(), capability = "parse", "Emulating capability over chat");
        let response = adapter.chat(structured::parse_chat_request(&request)).await?;
        Ok(structured::parse_structured(response.content()))
    }
}
