use super::types::{
    AnthropicContent, AnthropicMessage, AnthropicResponse, AnthropicTool, ContentBlock,
    ResponseContentBlock,
};
use crate::completion::{ChatResponse, FinishReason, TokenUsage};
use crate::message::{merge_system_messages, Message, MessageRole};
use crate::tools::{ToolCall, ToolDefinition};
use serde_json::Value;
use tracing::warn;

/// Convert messages to Anthropic format, returning the merged system prompt separately
pub(crate) fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut anthropic_messages: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => {}
            MessageRole::User => {
                anthropic_messages.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: AnthropicContent::Text(msg.content.clone()),
                });
            }
            MessageRole::Assistant if msg.tool_calls.is_empty() => {
                anthropic_messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: AnthropicContent::Text(msg.content.clone()),
                });
            }
            MessageRole::Assistant => {
                let mut blocks = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.content.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: msg.content.clone(),
                    });
                }
                blocks.extend(msg.tool_calls.iter().map(|call| ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: Value::Object(call.arguments.clone()),
                }));
                anthropic_messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: AnthropicContent::Blocks(blocks),
                });
            }
            MessageRole::Tool => {
                let Some(tool_use_id) = &msg.tool_call_id else {
                    continue;
                };
                let block = ContentBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: msg.content.clone(),
                };
                // Results answering one assistant turn share a single user turn
                let merge = matches!(
                    anthropic_messages.last(),
                    Some(AnthropicMessage {
                        role,
                        content: AnthropicContent::Blocks(blocks),
                    }) if role == "user"
                        && blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. }))
                );
                if merge {
                    if let Some(AnthropicMessage {
                        content: AnthropicContent::Blocks(blocks),
                        ..
                    }) = anthropic_messages.last_mut()
                    {
                        blocks.push(block);
                    }
                } else {
                    anthropic_messages.push(AnthropicMessage {
                        role: "user".to_string(),
                        content: AnthropicContent::Blocks(vec![block]),
                    });
                }
            }
        }
    }

    (merge_system_messages(messages), anthropic_messages)
}

/// Convert tool definition to Anthropic format
pub(crate) fn convert_tool(tool: &ToolDefinition) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.object_schema(),
    }
}

/// Normalize a Messages API response
pub(crate) fn parse_response(response: AnthropicResponse) -> ChatResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ResponseContentBlock::Text { text } => content.push_str(&text),
            ResponseContentBlock::ToolUse { id, name, input } => match input {
                Value::Object(arguments) => tool_calls.push(ToolCall { id, name, arguments }),
                _ => warn!(tool = %name, call_id = %id, "Dropping tool_use block with non-object input"),
            },
            ResponseContentBlock::Other => {}
        }
    }

    let finish_reason = FinishReason::resolve(response.stop_reason.as_deref(), !tool_calls.is_empty());

    ChatResponse {
        id: response.id,
        message: Message::assistant_with_tool_calls(content, tool_calls),
        usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        model: response.model,
        finish_reason,
    }
}
