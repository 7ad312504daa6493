//! Chat Completions streaming parser
//!
//! Each frame carries a `choices[0].delta`. Tool calls arrive as fragments
//! keyed by `index`: the first fragment names the call, later ones append to
//! its argument string. The stream ends with `data: [DONE]`.

use super::types::ChatCompletionChunk;
use crate::completion::{FinishReason, StreamChunk};
use crate::error::{Error, Result};
use crate::sse::StreamParser;
use crate::tools::tool_call_from_raw;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Per-connection parser state, reused by OpenAI-compatible providers
#[derive(Debug, Default)]
pub(crate) struct OpenAiStreamParser {
    id: String,
    tools: BTreeMap<usize, PendingToolCall>,
    finish_reason: Option<String>,
    finished: bool,
}

impl OpenAiStreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl StreamParser for OpenAiStreamParser {
    fn parse_frame(&mut self, _event: Option<&str>, data: &str) -> Result<Option<StreamChunk>> {
        let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping unparsable stream frame");
                return Ok(None);
            }
        };

        if let Some(error) = chunk.error {
            let kind = error.kind.unwrap_or_else(|| "error".to_string());
            return Err(Error::Stream(format!("{kind}: {}", error.message)));
        }
        if self.id.is_empty() && !chunk.id.is_empty() {
            self.id = chunk.id;
        }

        // Trailing usage-only frames have no choices
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(None);
        };

        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let pending = self.tools.entry(fragment.index).or_default();
            if let Some(id) = fragment.id {
                pending.id = id;
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    pending.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    pending.arguments.push_str(&arguments);
                }
            }
        }
        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }

        Ok(choice
            .delta
            .content
            .filter(|text| !text.is_empty())
            .map(|text| StreamChunk::text(self.id.clone(), text)))
    }

    fn finish(&mut self) -> Option<StreamChunk> {
        if self.finished {
            return None;
        }
        self.finished = true;

        // Plain text streams that never reported a finish reason end silently
        if self.tools.is_empty() && self.finish_reason.is_none() {
            return None;
        }

        let tool_calls: Vec<_> = std::mem::take(&mut self.tools)
            .into_values()
            .filter(|pending| !pending.name.is_empty())
            .filter_map(|pending| tool_call_from_raw(pending.id, pending.name, &pending.arguments))
            .collect();
        let finish_reason =
            FinishReason::resolve(self.finish_reason.as_deref(), !tool_calls.is_empty());

        Some(StreamChunk {
            id: self.id.clone(),
            delta: String::new(),
            tool_calls,
            finish_reason: Some(finish_reason),
        })
    }
}
