//! Gemini streaming parser
//!
//! With `alt=sse` every `data:` line is a complete `GenerateContentResponse`
//! holding the next slice of text. There is no sentinel: the stream ends when
//! the connection closes.

use super::convert::function_call_to_tool_call;
use super::types::{GeminiPart, GeminiResponse};
use crate::completion::{FinishReason, StreamChunk};
use crate::error::{Error, Result};
use crate::sse::StreamParser;
use crate::tools::ToolCall;
use tracing::warn;

#[derive(Debug, Default)]
pub(crate) struct GeminiStreamParser {
    id: Option<String>,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<String>,
    finished: bool,
}

impl GeminiStreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn id(&mut self) -> String {
        self.id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone()
    }
}

impl StreamParser for GeminiStreamParser {
    fn parse_frame(&mut self, _event: Option<&str>, data: &str) -> Result<Option<StreamChunk>> {
        let frame: GeminiResponse = match serde_json::from_str(data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Skipping unparsable Gemini stream frame");
                return Ok(None);
            }
        };

        if let Some(error) = frame.error {
            return Err(Error::Stream(format!("{}: {}", error.status, error.message)));
        }
        if self.id.is_none() {
            self.id = frame.response_id;
        }

        let Some(candidate) = frame.candidates.into_iter().next() else {
            return Ok(None);
        };

        let mut text = String::new();
        for part in candidate.content.parts {
            match part {
                GeminiPart::Text { text: t } => text.push_str(&t),
                GeminiPart::FunctionCall { function_call } => {
                    self.tool_calls.extend(function_call_to_tool_call(function_call));
                }
                GeminiPart::FunctionResponse { .. } | GeminiPart::Other(_) => {}
            }
        }
        if candidate.finish_reason.is_some() {
            self.finish_reason = candidate.finish_reason;
        }

        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(StreamChunk::text(self.id(), text)))
    }

    fn finish(&mut self) -> Option<StreamChunk> {
        if self.finished || (self.tool_calls.is_empty() && self.finish_reason.is_none()) {
            return None;
        }
        self.finished = true;

        let tool_calls = std::mem::take(&mut self.tool_calls);
        let finish_reason =
            FinishReason::resolve(self.finish_reason.as_deref(), !tool_calls.is_empty());
        Some(StreamChunk {
            id: self.id(),
            delta: String::new(),
            tool_calls,
            finish_reason: Some(finish_reason),
        })
    }
}
