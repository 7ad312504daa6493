//! Google Gemini - `generateContent` adapter
//!
//! Assistant turns use the `model` role, system text rides in the first user
//! turn, and function declarations are cleaned of schema keywords Gemini
//! rejects.

/// Message conversion utilities
pub mod convert;
/// Provider implementation
pub mod provider;
/// JSON Schema cleanup
pub mod schema;
/// Streaming frame parser
pub mod stream;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::GeminiProvider;
pub use types::{GeminiConfig, DEFAULT_MODEL, MODELS};
