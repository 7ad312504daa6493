/// Anthropic provider
pub mod anthropic;
/// Google Gemini provider
pub mod gemini;
/// Moonshot provider
pub mod moonshot;
/// OpenAI provider
pub mod openai;
/// Perplexity research provider
pub mod perplexity;

pub(crate) mod transport;
