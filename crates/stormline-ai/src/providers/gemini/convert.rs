//! Message and tool conversion utilities for Gemini API

use super::schema::strip_unsupported_keywords;
use super::types::{
    FunctionCall, FunctionDeclaration, FunctionResponse, GeminiContent, GeminiPart,
    GeminiResponse, GeminiTool,
};
use crate::completion::{ChatResponse, FinishReason, TokenUsage};
use crate::error::{Error, Result};
use crate::message::{merge_system_messages, Message, MessageRole};
use crate::tools::{ToolCall, ToolDefinition};
use serde_json::Value;
use tracing::warn;

fn content(role: &str, parts: Vec<GeminiPart>) -> GeminiContent {
    GeminiContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn is_function_response_turn(content: &GeminiContent) -> bool {
    content.role.as_deref() == Some("user")
        && !content.parts.is_empty()
        && content
            .parts
            .iter()
            .all(|p| matches!(p, GeminiPart::FunctionResponse { .. }))
}

/// Convert messages to Gemini `contents`.
///
/// Gemini has no system role here: merged system text is prepended as the
/// first part of the first user turn.
pub(crate) fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
    let mut contents: Vec<GeminiContent> = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => {}
            MessageRole::User => {
                contents.push(content(
                    "user",
                    vec![GeminiPart::Text {
                        text: msg.content.clone(),
                    }],
                ));
            }
            MessageRole::Assistant => {
                let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
                if !msg.content.is_empty() {
                    parts.push(GeminiPart::Text {
                        text: msg.content.clone(),
                    });
                }
                parts.extend(msg.tool_calls.iter().map(|call| GeminiPart::FunctionCall {
                    function_call: FunctionCall {
                        name: call.name.clone(),
                        args: Value::Object(call.arguments.clone()),
                    },
                }));
                if !parts.is_empty() {
                    contents.push(content("model", parts));
                }
            }
            MessageRole::Tool => {
                let Some(name) = &msg.name else {
                    warn!("Skipping tool result without a function name");
                    continue;
                };
                let response = match serde_json::from_str::<Value>(&msg.content) {
                    Ok(Value::Object(map)) => Value::Object(map),
                    _ => serde_json::json!({ "result": msg.content }),
                };
                let part = GeminiPart::FunctionResponse {
                    function_response: FunctionResponse {
                        name: name.clone(),
                        response,
                    },
                };

                // All responses to one model turn travel in a single user turn
                match contents.last_mut() {
                    Some(last) if is_function_response_turn(last) => last.parts.push(part),
                    _ => contents.push(content("user", vec![part])),
                }
            }
        }
    }

    if let Some(system) = merge_system_messages(messages) {
        let system_part = GeminiPart::Text { text: system };
        match contents
            .iter_mut()
            .find(|c| c.role.as_deref() == Some("user"))
        {
            Some(first_user) => first_user.parts.insert(0, system_part),
            None => contents.insert(0, content("user", vec![system_part])),
        }
    }

    contents
}

/// Convert tool definitions to one `functionDeclarations` block
pub(crate) fn convert_tools(tools: &[ToolDefinition]) -> Vec<GeminiTool> {
    let function_declarations = tools
        .iter()
        .map(|tool| {
            let mut parameters = tool.object_schema();
            strip_unsupported_keywords(&mut parameters);
            FunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters,
            }
        })
        .collect();

    vec![GeminiTool {
        function_declarations,
    }]
}

/// Gemini function calls carry no id; mint one so results can be matched
pub(crate) fn function_call_to_tool_call(call: FunctionCall) -> Option<ToolCall> {
    let id = format!("call_{}", uuid::Uuid::new_v4().simple());
    match call.args {
        Value::Object(arguments) => Some(ToolCall::new(id, call.name, arguments)),
        Value::Null => Some(ToolCall::new(id, call.name, serde_json::Map::new())),
        _ => {
            warn!(tool = %call.name, "Dropping function call with non-object args");
            None
        }
    }
}

/// Normalize a `generateContent` response
pub(crate) fn parse_response(response: GeminiResponse, model: &str) -> Result<ChatResponse> {
    let usage = response
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();
    let id = response
        .response_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let model = response.model_version.unwrap_or_else(|| model.to_string());

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(Error::InvalidResponse(format!("Gemini returned no candidates: {reason}")));
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.parts {
        match part {
            GeminiPart::Text { text: t } => text.push_str(&t),
            GeminiPart::FunctionCall { function_call } => {
                tool_calls.extend(function_call_to_tool_call(function_call));
            }
            GeminiPart::FunctionResponse { .. } | GeminiPart::Other(_) => {}
        }
    }

    // Function calls come back with finishReason STOP
    let finish_reason =
        FinishReason::resolve(candidate.finish_reason.as_deref(), !tool_calls.is_empty());

    Ok(ChatResponse {
        id,
        message: Message::assistant_with_tool_calls(text, tool_calls),
        usage,
        model,
        finish_reason,
    })
}
