//! Anthropic - Claude Messages API adapter
//!
//! System prompts travel in the top-level `system` field, tools are declared
//! with `input_schema`, and tool results go back as `tool_result` blocks in a
//! user turn.

/// Message conversion utilities
pub mod convert;
/// Provider implementation
pub mod provider;
/// Streaming event parser
pub mod stream;
/// API types and configuration
pub mod types;


pub use provider::AnthropicProvider;
pub use types::{AnthropicConfig, DEFAULT_MODEL, MODELS};
