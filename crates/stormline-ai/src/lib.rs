//! Stormline AI - provider routing layer
//!
//! This crate gives the rest of Stormline one provider-agnostic contract for
//! chat, streaming, research, classification, and structured extraction:
//! - Router: task → model selection, fallback, and capability emulation
//! - Anthropic: Claude Messages API
//! - OpenAI: Chat Completions API
//! - Moonshot: Kimi long-context models (OpenAI-compatible)
//! - Gemini: Google `generateContent` API
//! - Perplexity: Sonar web research with citations
//! - Vision: roof and exterior damage analysis from photos
//! - Context: customer situation rendered into system prompts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod context;
pub mod error;
pub mod message;
pub mod providers;
pub mod router;
pub mod sse;
pub mod structured;
pub mod tools;
pub mod util;
pub mod vision;

pub use completion::{
    collect_stream, CategoryScore, ChatRequest, ChatResponse, ChunkStream, Citation,
    ClassifyRequest, ClassifyResult, FinishReason, ParseRequest, ParseResult, ResearchRequest,
    ResearchResult, SearchRecency, StreamChunk, TokenUsage,
};
pub use context::{render_system_prompt, CustomerContext};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use router::{
    AiRouter, AiTask, Capabilities, MockAdapter, ProviderAdapter, ProviderKind, RouteTable,
    RouterBuilder, RouterConfig,
};
pub use tools::{ToolCall, ToolDefinition};
pub use vision::{DamageAnalysisResult, DamageAnalyzer, ImageInput};

// Re-export provider types
pub use providers::anthropic::{AnthropicConfig, AnthropicProvider};
pub use providers::gemini::{GeminiConfig, GeminiProvider};
pub use providers::moonshot::{MoonshotConfig, MoonshotProvider};
pub use providers::openai::{OpenAiConfig, OpenAiProvider};
pub use providers::perplexity::{PerplexityConfig, PerplexityProvider};
