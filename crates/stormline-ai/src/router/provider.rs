//! Provider adapter trait and capability flags
//!
//! Optional operations are advertised through [`Capabilities`] so the router
//! can check for them with a typed query instead of calling and failing.

use super::types::ProviderKind;
use crate::completion::{
    ChatRequest, ChatResponse, ChunkStream, ClassifyRequest, ClassifyResult, ParseRequest,
    ParseResult, ResearchRequest, ResearchResult,
};
use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Operations an adapter implements natively
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Non-streaming chat
        const CHAT     = 1 << 0;
        /// Server-sent-event streaming
        const STREAM   = 1 << 1;
        /// Function/tool calling
        const TOOLS    = 1 << 2;
        /// Web research with citations
        const RESEARCH = 1 << 3;
        /// Native classification
        const CLASSIFY = 1 << 4;
        /// Native structured extraction
        const PARSE    = 1 << 5;
        /// Image input
        const VISION   = 1 << 6;
    }
}

impl Capabilities {
    /// Human-readable name of a single flag
    #[must_use]
    pub fn label(&self) -> &'static str {
        const LABELS: [(Capabilities, &str); 7] = [
            (Capabilities::CHAT, "chat"),
            (Capabilities::STREAM, "streaming"),
            (Capabilities::TOOLS, "tools"),
            (Capabilities::RESEARCH, "research"),
            (Capabilities::CLASSIFY, "classify"),
            (Capabilities::PARSE, "parse"),
            (Capabilities::VISION, "vision"),
        ];
        LABELS
            .iter()
            .find(|(flag, _)| flag == self)
            .map_or("capabilities", |(_, label)| *label)
    }
}

/// Trait for provider adapters
///
/// Adapters hold only immutable configuration and a pooled HTTP client, so one
/// instance serves any number of overlapping requests.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Wire-protocol family
    fn provider(&self) -> ProviderKind;

    /// Model identifier this adapter is registered under
    fn model_id(&self) -> &str;

    /// Natively supported operations
    fn capabilities(&self) -> Capabilities;

    /// Whether a capability is supported
    fn supports(&self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    /// Complete a conversation
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Stream a conversation.
    ///
    /// The returned stream opens its connection on first poll; dropping it
    /// closes the connection.
    fn chat_stream(&self, _request: ChatRequest) -> Result<ChunkStream> {
        Err(self.unsupported(Capabilities::STREAM))
    }

    /// Research with citations
    async fn research(&self, _request: ResearchRequest) -> Result<ResearchResult> {
        Err(self.unsupported(Capabilities::RESEARCH))
    }

    /// Classify text
    async fn classify(&self, _request: ClassifyRequest) -> Result<ClassifyResult> {
        Err(self.unsupported(Capabilities::CLASSIFY))
    }

    /// Extract structured data
    async fn parse(&self, _request: ParseRequest) -> Result<ParseResult> {
        Err(self.unsupported(Capabilities::PARSE))
    }

    /// Build an [`Error::UnsupportedCapability`] for this adapter
    fn unsupported(&self, capability: Capabilities) -> Error {
        Error::UnsupportedCapability {
            adapter: self.model_id().to_string(),
            capability: capability.label().to_string(),
        }
    }
}
