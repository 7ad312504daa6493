//! Vision - roof and exterior damage analysis
//!
//! One-shot image analysis: an image and a fixed JSON-schema prompt go to a
//! vision-capable backend, and the reply is read into a
//! [`DamageAnalysisResult`]. No streaming, no tools. Unreadable replies
//! degrade instead of failing.

/// Vision backends
pub mod backend;
/// Damage prompt, parsing, and summaries
pub mod report;
/// Report and image types
pub mod types;

mod analyzer;


pub use analyzer::DamageAnalyzer;
pub use backend::{AnthropicVision, OpenAiVision, VisionBackend};
pub use report::{damage_prompt, mock_result, parse_damage_report, summarize_damage, MOCK_MODEL};
pub use types::{
    CostRange, DamageAnalysisResult, DamageItem, DamageSeverity, EncodedImage, ImageInput,
    Recommendation, RoofCondition,
};
