//! Damage analyzer: ordered vision backends with graceful fall-through

use super::backend::{
    AnthropicVision, OpenAiVision, VisionBackend, ANTHROPIC_VISION_MODEL, OPENAI_VISION_MODEL,
};
use super::report::{damage_prompt, mock_result, parse_damage_report};
use super::types::{DamageAnalysisResult, EncodedImage, ImageInput};
use crate::error::{Error, Result};
use crate::providers::anthropic::AnthropicConfig;
use crate::providers::openai::OpenAiConfig;
use crate::providers::transport::{build_client, millis};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Deadline for fetching a remote image
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs damage analysis against vision backends in preference order
pub struct DamageAnalyzer {
    client: Client,
    backends: Vec<Arc<dyn VisionBackend>>,
    fetch_timeout: Duration,
}

impl DamageAnalyzer {
    /// Create an analyzer over explicit backends (tried in order)
    pub fn new(backends: Vec<Arc<dyn VisionBackend>>) -> Result<Self> {
        Ok(Self::with_client(build_client()?, backends))
    }

    /// Create an analyzer reusing an HTTP client for image fetches
    #[must_use]
    pub fn with_client(client: Client, backends: Vec<Arc<dyn VisionBackend>>) -> Self {
        Self {
            client,
            backends,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// OpenAI first, Anthropic second, each only when its key is set
    pub fn from_env() -> Result<Self> {
        let client = build_client()?;
        let mut backends: Vec<Arc<dyn VisionBackend>> = Vec::new();

        if let Ok(config) = OpenAiConfig::from_env() {
            let config = config.with_model(OPENAI_VISION_MODEL);
            backends.push(Arc::new(OpenAiVision::new(client.clone(), config)));
        }
        if let Ok(config) = AnthropicConfig::from_env() {
            let config = config.with_model(ANTHROPIC_VISION_MODEL);
            backends.push(Arc::new(AnthropicVision::new(client.clone(), config)));
        }

        info!(
            backends = ?backends.iter().map(|b| b.model_id()).collect::<Vec<_>>(),
            "Damage analyzer initialized"
        );
        Ok(Self::with_client(client, backends))
    }

    /// Set the image fetch deadline
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Backend model identifiers, in preference order
    #[must_use]
    pub fn backend_models(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.model_id()).collect()
    }

    /// Analyze one image.
    ///
    /// Backend transport errors and unreadable reports fall through to the
    /// next backend. The first readable report wins; otherwise the first
    /// degraded report is returned, and only when every backend errored is
    /// the last error returned. With no backends at all a placeholder report
    /// (`model: "mock"`) is returned.
    ///
    /// # Errors
    /// Image fetch failures, and backend failures when every backend failed.
    #[instrument(skip(self, image, context), fields(backends = self.backends.len()))]
    pub async fn analyze(
        &self,
        image: &ImageInput,
        context: Option<&str>,
    ) -> Result<DamageAnalysisResult> {
        if self.backends.is_empty() {
            info!("No vision backend configured, returning placeholder report");
            return Ok(mock_result());
        }

        let encoded = self.encode(image).await?;
        let prompt = damage_prompt(context);

        let mut degraded: Option<DamageAnalysisResult> = None;
        let mut last_error: Option<Error> = None;

        for backend in &self.backends {
            match backend.describe(&encoded, &prompt).await {
                Ok(text) => {
                    let report = parse_damage_report(&text, backend.model_id());
                    if !report.is_degraded() {
                        return Ok(report);
                    }
                    warn!(adapter = %backend.model_id(), "Unreadable damage report, trying next backend");
                    degraded.get_or_insert(report);
                }
                Err(e) => {
                    warn!(adapter = %backend.model_id(), error = %e, "Vision backend failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match (degraded, last_error) {
            (Some(report), _) => Ok(report),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(mock_result()),
        }
    }

    async fn encode(&self, image: &ImageInput) -> Result<EncodedImage> {
        match image {
            ImageInput::Base64 { data, media_type } => Ok(EncodedImage {
                data: strip_data_url(data).to_string(),
                media_type: media_type.clone(),
            }),
            ImageInput::Url(url) => self.fetch(url).await,
        }
    }

    async fn fetch(&self, url: &str) -> Result<EncodedImage> {
        debug!(url = %url, "Fetching image");
        let timeout_ms = millis(self.fetch_timeout);
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "image_fetch".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"));
        let media_type = header_type.unwrap_or_else(|| media_type_for(url).to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout_ms))?;
        debug!(bytes = bytes.len(), media_type = %media_type, "Image fetched");

        Ok(EncodedImage {
            data: BASE64.encode(&bytes),
            media_type,
        })
    }
}

/// Accept `data:<type>;base64,<payload>` where a bare payload is expected
fn strip_data_url(data: &str) -> &str {
    match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(data, |(_, payload)| payload),
        None => data,
    }
}

/// Guess a MIME type from a URL's extension, defaulting to JPEG
fn media_type_for(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}
