//! Core types for task routing
//!
//! `AiTask` classifies intent and drives model selection; `ProviderKind`
//! names the wire-protocol family an adapter speaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Task
// ============================================================================

/// Task type used to pick a preferred model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiTask {
    /// General conversation
    #[default]
    Chat,
    /// Multi-step tool use
    ToolCall,
    /// Single, cheap tool invocation
    SimpleTool,
    /// Web-grounded research with citations
    Research,
    /// Label text against a fixed category list
    Classify,
    /// Extract structured data from free text
    Parse,
    /// Condense long material
    Summarize,
}

impl AiTask {
    /// All tasks, in declaration order
    pub const ALL: [AiTask; 7] = [
        Self::Chat,
        Self::ToolCall,
        Self::SimpleTool,
        Self::Research,
        Self::Classify,
        Self::Parse,
        Self::Summarize,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ToolCall => "tool_call",
            Self::SimpleTool => "simple_tool",
            Self::Research => "research",
            Self::Classify => "classify",
            Self::Parse => "parse",
            Self::Summarize => "summarize",
        }
    }

    /// Default `(max_tokens, temperature)` applied when a request leaves them unset
    ///
    /// Extraction-style tasks run cold and short; conversation runs warmer.
    #[must_use]
    pub fn default_budget(&self) -> (u32, f32) {
        match self {
            Self::Classify => (200, 0.1),
            Self::Parse => (1000, 0.1),
            Self::Research => (1500, 0.2),
            Self::Summarize => (1500, 0.3),
            Self::Chat => (2000, 0.7),
            Self::ToolCall => (2000, 0.4),
            Self::SimpleTool => (1000, 0.2),
        }
    }
}

impl fmt::Display for AiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiTask {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown task: {s}"))
    }
}

// ============================================================================
// Provider family
// ============================================================================

/// Wire-protocol family of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI Chat Completions API
    #[serde(rename = "openai")]
    OpenAi,
    /// Moonshot (Kimi), OpenAI-compatible long-context models
    Moonshot,
    /// Google Gemini generateContent API
    Gemini,
    /// Perplexity Sonar, citation-oriented research
    Perplexity,
}

impl ProviderKind {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Moonshot => "moonshot",
            Self::Gemini => "gemini",
            Self::Perplexity => "perplexity",
        }
    }

    /// Environment variable carrying this family's credential
    #[must_use]
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Moonshot => "MOONSHOT_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Perplexity => "PERPLEXITY_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
