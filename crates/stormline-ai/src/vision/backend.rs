//! Vision backends
//!
//! A backend sends one image plus the damage prompt to a vision-capable
//! model and returns the model's raw text. Parsing happens in the analyzer.

use super::types::EncodedImage;
use crate::error::{Error, Result};
use crate::providers::anthropic::types::{
    AnthropicContent, AnthropicMessage, AnthropicRequest, AnthropicResponse, ContentBlock,
    ImageSource,
};
use crate::providers::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::providers::openai::convert::image_message;
use crate::providers::openai::types::{ChatCompletionRequest, ResponseFormat};
use crate::providers::openai::{OpenAiConfig, OpenAiProvider};
use crate::providers::transport::send_json;
use crate::router::ProviderKind;
use reqwest::Client;
use tracing::instrument;

/// Default OpenAI vision model
pub const OPENAI_VISION_MODEL: &str = "gpt-4o";

/// Default Anthropic vision model
pub const ANTHROPIC_VISION_MODEL: &str = "claude-sonnet-4-5";

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.1;

/// A model that can describe an image
#[async_trait::async_trait]
pub trait VisionBackend: Send + Sync {
    /// Model identifier, recorded on the report
    fn model_id(&self) -> &str;

    /// Send the image and prompt, returning the model's text
    async fn describe(&self, image: &EncodedImage, prompt: &str) -> Result<String>;
}

/// OpenAI vision: `image_url` part with a data URL, JSON mode on
pub struct OpenAiVision {
    provider: OpenAiProvider,
}

impl OpenAiVision {
    /// Create a backend
    #[must_use]
    pub fn new(client: Client, config: OpenAiConfig) -> Self {
        Self {
            provider: OpenAiProvider::with_client(client, config),
        }
    }
}

#[async_trait::async_trait]
impl VisionBackend for OpenAiVision {
    fn model_id(&self) -> &str {
        &self.provider.config().model
    }

    #[instrument(skip(self, image, prompt), fields(model = %self.model_id()))]
    async fn describe(&self, image: &EncodedImage, prompt: &str) -> Result<String> {
        let body = ChatCompletionRequest {
            model: self.provider.config().model.clone(),
            messages: vec![image_message(prompt, image.data_url())],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
            tools: None,
            response_format: Some(ResponseFormat::json_object()),
            search_recency_filter: None,
            stream: false,
        };
        let response = self.provider.inner.complete(&body).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| Error::InvalidResponse("openai: no choices in vision response".into()))
    }
}

/// Anthropic vision: base64 `image` content block
pub struct AnthropicVision {
    provider: AnthropicProvider,
}

impl AnthropicVision {
    /// Create a backend
    #[must_use]
    pub fn new(client: Client, config: AnthropicConfig) -> Self {
        Self {
            provider: AnthropicProvider::with_client(client, config),
        }
    }
}

#[async_trait::async_trait]
impl VisionBackend for AnthropicVision {
    fn model_id(&self) -> &str {
        &self.provider.config().model
    }

    #[instrument(skip(self, image, prompt), fields(model = %self.model_id()))]
    async fn describe(&self, image: &EncodedImage, prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let body = AnthropicRequest {
            model: config.model.clone(),
            max_tokens: MAX_TOKENS,
            system: None,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: AnthropicContent::Blocks(vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            r#type: "base64",
                            media_type: image.media_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    ContentBlock::Text {
                        text: prompt.to_string(),
                    },
                ]),
            }],
            temperature: Some(TEMPERATURE),
            tools: None,
            stream: false,
        };

        let response: AnthropicResponse = send_json(
            ProviderKind::Anthropic,
            self.provider.post(&body),
            config.timeout,
        )
        .await?;
        Ok(crate::providers::anthropic::convert::parse_response(response)
            .message
            .content)
    }
}
