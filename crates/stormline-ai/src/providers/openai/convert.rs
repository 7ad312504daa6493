use super::types::{
    ChatCompletionResponse, ContentPart, ImageUrl, WireContent, WireFunction, WireFunctionCall,
    WireMessage, WireTool, WireToolCall,
};
use crate::completion::{ChatResponse, FinishReason, TokenUsage};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::tools::{tool_call_from_raw, ToolDefinition};

fn text_message(role: &'static str, content: &str) -> WireMessage {
    WireMessage {
        role,
        content: Some(WireContent::Text(content.to_string())),
        tool_calls: None,
        tool_call_id: None,
        name: None,
    }
}

/// Convert uniform messages to Chat Completions messages
pub(crate) fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|msg| match msg.role {
            MessageRole::System => text_message("system", &msg.content),
            MessageRole::User => text_message("user", &msg.content),
            MessageRole::Assistant if msg.tool_calls.is_empty() => {
                text_message("assistant", &msg.content)
            }
            MessageRole::Assistant => WireMessage {
                role: "assistant",
                content: (!msg.content.is_empty())
                    .then(|| WireContent::Text(msg.content.clone())),
                tool_calls: Some(
                    msg.tool_calls
                        .iter()
                        .map(|call| WireToolCall {
                            id: call.id.clone(),
                            kind: "function".to_string(),
                            function: WireFunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments_json(),
                            },
                        })
                        .collect(),
                ),
                tool_call_id: None,
                name: None,
            },
            MessageRole::Tool => WireMessage {
                tool_call_id: msg.tool_call_id.clone(),
                ..text_message("tool", &msg.content)
            },
        })
        .collect()
}

/// Merge system messages into one leading system turn, joined by a blank line
pub(crate) fn convert_messages_single_system(messages: &[Message]) -> Vec<WireMessage> {
    let mut converted = Vec::with_capacity(messages.len());
    if let Some(system) = crate::message::merge_system_messages(messages) {
        converted.push(text_message("system", &system));
    }
    let rest: Vec<Message> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .cloned()
        .collect();
    converted.extend(convert_messages(&rest));
    converted
}

/// User turn carrying a prompt and one image as a data URL
pub(crate) fn image_message(prompt: &str, data_url: String) -> WireMessage {
    WireMessage {
        content: Some(WireContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_url,
                    detail: Some("high"),
                },
            },
        ])),
        ..text_message("user", "")
    }
}

pub(crate) fn convert_tool(tool: &ToolDefinition) -> WireTool {
    WireTool {
        kind: "function",
        function: WireFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.object_schema(),
        },
    }
}

/// Normalize a Chat Completions response.
///
/// Tool calls with malformed argument JSON are dropped individually.
pub(crate) fn parse_response(response: ChatCompletionResponse) -> Result<ChatResponse> {
    let usage = response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

    let tool_calls: Vec<_> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|call| tool_call_from_raw(call.id, call.function.name, &call.function.arguments))
        .collect();

    let finish_reason = FinishReason::resolve(choice.finish_reason.as_deref(), !tool_calls.is_empty());
    let content = choice.message.content.unwrap_or_default();

    Ok(ChatResponse {
        id: response.id,
        message: Message::assistant_with_tool_calls(content, tool_calls),
        usage,
        model: response.model,
        finish_reason,
    })
}
