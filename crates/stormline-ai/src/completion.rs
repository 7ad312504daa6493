//! Request and response types for the uniform contract

use crate::error::Result;
use crate::message::Message;
use crate::router::AiTask;
use crate::tools::{ToolCall, ToolDefinition};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

/// Token usage information. Always present, zero-filled when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build usage from prompt and completion counts
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn
    #[default]
    Stop,
    /// The model requested one or more tool invocations
    ToolCalls,
    /// Token limit reached
    Length,
    /// Provider-side refusal or failure
    Error,
}

impl FinishReason {
    /// Normalize a provider finish reason.
    ///
    /// A turn that produced tool calls is always `ToolCalls`, whatever the
    /// provider reported.
    #[must_use]
    pub fn resolve(native: Option<&str>, has_tool_calls: bool) -> Self {
        if has_tool_calls {
            return Self::ToolCalls;
        }
        match native.map(str::to_ascii_lowercase).as_deref() {
            Some("tool_calls" | "tool_use" | "function_call") => Self::ToolCalls,
            Some("length" | "max_tokens" | "max_output_tokens") => Self::Length,
            Some("content_filter" | "safety" | "recitation" | "blocklist" | "prohibited_content"
            | "spii" | "malformed_function_call" | "refusal" | "error") => Self::Error,
            _ => Self::Stop,
        }
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::ToolCalls => "tool_calls",
            Self::Length => "length",
            Self::Error => "error",
        }
    }
}

/// Chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Available tools
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// Task used for routing (defaults to chat)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<AiTask>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether the caller intends to stream
    #[serde(default)]
    pub stream: bool,
    /// Ask for a bare JSON object when the provider has a native JSON mode
    #[serde(default)]
    pub json_output: bool,
}

impl ChatRequest {
    /// Create a request from a conversation
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Add a message
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the routing task
    #[must_use]
    pub fn with_task(mut self, task: AiTask) -> Self {
        self.task = Some(task);
        self
    }

    /// Set the available tools
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Request JSON-only output
    #[must_use]
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Resolved task (chat when unset)
    #[must_use]
    pub fn task(&self) -> AiTask {
        self.task.unwrap_or_default()
    }

    /// Fill unset `max_tokens` / `temperature` from the task's budget
    #[must_use]
    pub fn with_task_defaults(mut self) -> Self {
        let (max_tokens, temperature) = self.task().default_budget();
        self.max_tokens.get_or_insert(max_tokens);
        self.temperature.get_or_insert(temperature);
        self
    }
}

/// Chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider response id
    pub id: String,
    /// Assistant message, including any tool calls
    pub message: Message,
    /// Token usage
    pub usage: TokenUsage,
    /// Model used
    pub model: String,
    /// Finish reason
    pub finish_reason: FinishReason,
}

impl ChatResponse {
    /// Text content of the assistant turn
    #[must_use]
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Tool calls requested by the assistant turn
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }
}

/// One incremental unit of a streamed assistant response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Response id, shared by every chunk of one stream
    pub id: String,
    /// Text delta
    pub delta: String,
    /// Completed tool calls (only on the final chunk)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Finish reason (only on the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Text-only chunk
    #[must_use]
    pub fn text(id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delta: delta.into(),
            ..Default::default()
        }
    }
}

/// Lazy, ordered, finite sequence of stream chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Drain a stream into a single response.
///
/// Deltas are concatenated in yield order. The first error aborts collection.
pub async fn collect_stream(mut stream: ChunkStream, model: impl Into<String>) -> Result<ChatResponse> {
    let mut id = String::new();
    let mut content = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if id.is_empty() {
            id = chunk.id;
        }
        content.push_str(&chunk.delta);
        tool_calls.extend(chunk.tool_calls);
        if chunk.finish_reason.is_some() {
            finish_reason = chunk.finish_reason;
        }
    }

    let finish_reason = if tool_calls.is_empty() {
        finish_reason.unwrap_or_default()
    } else {
        FinishReason::ToolCalls
    };

    Ok(ChatResponse {
        id,
        message: Message::assistant_with_tool_calls(content, tool_calls),
        usage: TokenUsage::default(),
        model: model.into(),
        finish_reason,
    })
}

// ============================================================================
// Research / Classification / Parsing
// ============================================================================

/// Recency window for research providers that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchRecency {
    /// Last 24 hours
    Day,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// Last 365 days
    Year,
}

impl SearchRecency {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Research request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    /// The research question
    pub query: String,
    /// Additional background folded into the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Restrict sources to a recency window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recency: Option<SearchRecency>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ResearchRequest {
    /// Create a research request
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set background context
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set recency window
    #[must_use]
    pub fn with_recency(mut self, recency: SearchRecency) -> Self {
        self.recency = Some(recency);
        self
    }
}

/// A cited source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source title
    pub title: String,
    /// Source URL
    pub url: String,
    /// Relevant excerpt
    #[serde(default)]
    pub snippet: String,
}

/// Research result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    /// Answer text
    pub answer: String,
    /// Sources backing the answer
    pub citations: Vec<Citation>,
}

/// Classification request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Text to classify
    pub text: String,
    /// Allowed category labels, in priority order
    pub categories: Vec<String>,
    /// Extra instructions for the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ClassifyRequest {
    /// Create a classification request
    #[must_use]
    pub fn new<I, S>(text: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            instructions: None,
        }
    }
}

/// One label with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Category label
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Classification result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResult {
    /// Scored categories, highest confidence first
    pub categories: Vec<CategoryScore>,
}

impl ClassifyResult {
    /// Highest-confidence category
    #[must_use]
    pub fn top(&self) -> Option<&CategoryScore> {
        self.categories.first()
    }
}

/// Structured-extraction request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseRequest {
    /// Free text to extract from
    pub text: String,
    /// JSON schema the output should match
    pub schema: Value,
    /// Extra instructions for the extractor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ParseRequest {
    /// Create a parse request
    #[must_use]
    pub fn new(text: impl Into<String>, schema: Value) -> Self {
        Self {
            text: text.into(),
            schema,
            instructions: None,
        }
    }
}

/// Structured-extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Extracted object (empty on failure)
    pub data: Value,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Default for ParseResult {
    fn default() -> Self {
        Self {
            data: Value::Object(serde_json::Map::new()),
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::new(20, 9).total_tokens, 29);
        assert_eq!(TokenUsage::new(u32::MAX, 5).total_tokens, u32::MAX);
    }

    #[test]
    fn test_finish_reason_resolve() {
        assert_eq!(FinishReason::resolve(Some("stop"), false), FinishReason::Stop);
        assert_eq!(FinishReason::resolve(Some("end_turn"), false), FinishReason::Stop);
        assert_eq!(FinishReason::resolve(Some("MAX_TOKENS"), false), FinishReason::Length);
        assert_eq!(FinishReason::resolve(Some("tool_use"), false), FinishReason::ToolCalls);
        assert_eq!(FinishReason::resolve(Some("SAFETY"), false), FinishReason::Error);
        assert_eq!(FinishReason::resolve(None, false), FinishReason::Stop);
        // Text plus a tool call is still a tool-call turn
        assert_eq!(FinishReason::resolve(Some("stop"), true), FinishReason::ToolCalls);
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![Message::system("You are helpful")])
            .with_message(Message::user("Hello"))
            .with_task(AiTask::Summarize)
            .with_max_tokens(100)
            .with_temperature(0.7);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.task(), AiTask::Summarize);
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(ChatRequest::default().task(), AiTask::Chat);
    }

    #[test]
    fn test_parse_result_default_is_empty_object() {
        let result = ParseResult::default();
        assert_eq!(result.data, serde_json::json!({}));
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_collect_stream_concatenates_in_order() {
        let chunks: Vec<Result<StreamChunk>> = vec![
            Ok(StreamChunk::text("resp_1", "Hel")),
            Ok(StreamChunk::text("resp_1", "lo")),
            Ok(StreamChunk {
                id: "resp_1".into(),
                finish_reason: Some(FinishReason::Stop),
                ..Default::default()
            }),
        ];
        let response = collect_stream(Box::pin(stream::iter(chunks)), "gpt-4o")
            .await
            .unwrap();
        assert_eq!(response.id, "resp_1");
        assert_eq!(response.content(), "Hello");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_collect_stream_propagates_error() {
        let chunks: Vec<Result<StreamChunk>> = vec![
            Ok(StreamChunk::text("r", "partial")),
            Err(crate::Error::Timeout(10)),
        ];
        let err = collect_stream(Box::pin(stream::iter(chunks)), "m")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
