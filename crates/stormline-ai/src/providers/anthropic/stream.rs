//! Anthropic streaming event parser
//!
//! Event sequence: `message_start`, then per content block
//! `content_block_start` / `content_block_delta`* / `content_block_stop`,
//! then `message_delta` (stop reason) and the terminal `message_stop`.

use crate::completion::{FinishReason, StreamChunk};
use crate::error::{Error, Result};
use crate::sse::StreamParser;
use crate::tools::tool_call_from_raw;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartMessage,
    },
    ContentBlockStart {
        index: usize,
        content_block: StartBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop,
    MessageDelta {
        delta: MessageDeltaBody,
    },
    MessageStop,
    Ping,
    Error {
        error: StreamErrorBody,
    },
}

#[derive(Debug, Deserialize)]
struct StartMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StartBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    json: String,
}

/// Per-connection parser state
#[derive(Debug, Default)]
pub(crate) struct AnthropicStreamParser {
    id: String,
    tools: BTreeMap<usize, PendingToolUse>,
    stop_reason: Option<String>,
    final_emitted: bool,
    terminal: bool,
}

impl AnthropicStreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn final_chunk(&mut self) -> Option<StreamChunk> {
        if self.final_emitted {
            return None;
        }
        self.final_emitted = true;

        let tool_calls: Vec<_> = std::mem::take(&mut self.tools)
            .into_values()
            .filter_map(|pending| tool_call_from_raw(pending.id, pending.name, &pending.json))
            .collect();
        let finish_reason = FinishReason::resolve(self.stop_reason.as_deref(), !tool_calls.is_empty());

        Some(StreamChunk {
            id: self.id.clone(),
            delta: String::new(),
            tool_calls,
            finish_reason: Some(finish_reason),
        })
    }

    fn text_chunk(&self, text: String) -> Option<StreamChunk> {
        (!text.is_empty()).then(|| StreamChunk::text(self.id.clone(), text))
    }
}

impl StreamParser for AnthropicStreamParser {
    fn parse_frame(&mut self, _event: Option<&str>, data: &str) -> Result<Option<StreamChunk>> {
        let event: StreamEvent = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping unparsable Anthropic stream frame");
                return Ok(None);
            }
        };

        Ok(match event {
            StreamEvent::MessageStart { message } => {
                self.id = message.id;
                None
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                StartBlock::Text { text } => self.text_chunk(text),
                StartBlock::ToolUse { id, name } => {
                    self.tools.insert(
                        index,
                        PendingToolUse {
                            id,
                            name,
                            json: String::new(),
                        },
                    );
                    None
                }
                StartBlock::Other => None,
            },
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => self.text_chunk(text),
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(pending) = self.tools.get_mut(&index) {
                        pending.json.push_str(&partial_json);
                    }
                    None
                }
                BlockDelta::Other => None,
            },
            StreamEvent::MessageDelta { delta } => {
                self.stop_reason = delta.stop_reason;
                self.final_chunk()
            }
            StreamEvent::MessageStop => {
                self.terminal = true;
                self.final_chunk()
            }
            StreamEvent::ContentBlockStop | StreamEvent::Ping => None,
            StreamEvent::Error { error } => {
                return Err(Error::Stream(format!("{}: {}", error.r#type, error.message)));
            }
        })
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn finish(&mut self) -> Option<StreamChunk> {
        // A connection that closed before any content has nothing to report
        if self.id.is_empty() && self.tools.is_empty() && self.stop_reason.is_none() {
            return None;
        }
        self.final_chunk()
    }
}
