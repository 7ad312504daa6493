//! OpenAI - Chat Completions adapter
//!
//! The wire types, converters, and stream parser here are also used by the
//! OpenAI-compatible Moonshot and Perplexity adapters.

/// Message conversion utilities
pub mod convert;
/// Provider implementation
pub mod provider;
/// Streaming chunk parser
pub mod stream;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::OpenAiProvider;
pub use types::{OpenAiConfig, DEFAULT_MODEL, MODELS};
