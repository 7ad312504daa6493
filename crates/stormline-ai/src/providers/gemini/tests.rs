//! Tests for Gemini provider

use super::convert::{convert_messages, convert_tools, parse_response};
use super::schema::strip_unsupported_keywords;
use super::stream::GeminiStreamParser;
use super::types::{GeminiConfig, GeminiPart, GeminiResponse, DEFAULT_BASE_URL, MODELS};
use crate::completion::{FinishReason, StreamChunk};
use crate::message::Message;
use crate::sse::SseDecoder;
use crate::tools::{ToolCall, ToolDefinition};
use serde_json::json;
use std::time::Duration;

fn replay(body: &str) -> Vec<StreamChunk> {
    let mut decoder = SseDecoder::new();
    let mut parser = GeminiStreamParser::new();
    let mut chunks = Vec::new();
    for piece in body.as_bytes().chunks(11) {
        chunks.extend(decoder.feed_into(&mut parser, piece).unwrap());
    }
    chunks.extend(decoder.finish_into(&mut parser).unwrap());
    chunks
}

#[test]
fn test_config_builder() {
    let config = GeminiConfig::new("test-key")
        .with_model("gemini-2.5-pro")
        .with_max_tokens(4096)
        .with_timeout(Duration::from_secs(30));

    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.model, "gemini-2.5-pro");
    assert_eq!(config.default_max_tokens, 4096);
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(MODELS.contains(&"gemini-2.5-flash"));
}

#[test]
fn test_config_debug_masks_key() {
    let config = GeminiConfig::new("AIza1234567890abcdefghij");
    let debug_str = format!("{:?}", config);

    assert!(!debug_str.contains("1234567890"));
    assert!(debug_str.contains("AIza...ghij"));
}

#[test]
fn test_system_text_prepended_to_first_user_turn() {
    let messages = vec![
        Message::system("You are a roofing assistant."),
        Message::user("Hello"),
        Message::assistant("Hi there!"),
        Message::system("Be brief."),
        Message::user("Is hail covered?"),
    ];

    let converted = convert_messages(&messages);
    assert_eq!(converted.len(), 3);
    assert_eq!(converted[0].role.as_deref(), Some("user"));
    assert_eq!(converted[1].role.as_deref(), Some("model"));

    let first = serde_json::to_value(&converted[0]).unwrap();
    assert_eq!(first["parts"][0]["text"], "You are a roofing assistant.\n\nBe brief.");
    assert_eq!(first["parts"][1]["text"], "Hello");

    let third = serde_json::to_value(&converted[2]).unwrap();
    assert_eq!(third["parts"].as_array().unwrap().len(), 1);
}

#[test]
fn test_system_only_conversation() {
    let converted = convert_messages(&[Message::system("Summarize.")]);
    assert_eq!(converted.len(), 1);
    assert_eq!(converted[0].role.as_deref(), Some("user"));
}

#[test]
fn test_function_responses_share_a_turn() {
    let first = ToolCall::new("call_1", "get_claim", serde_json::Map::new());
    let second = ToolCall::new("call_2", "get_weather", serde_json::Map::new());
    let messages = vec![
        Message::user("Check both"),
        Message::assistant_with_tool_calls("", vec![first.clone(), second.clone()]),
        Message::tool_response(&first, "{\"status\": \"open\"}"),
        Message::tool_response(&second, "sunny"),
    ];

    let converted = convert_messages(&messages);
    assert_eq!(converted.len(), 3);
    let turn = serde_json::to_value(&converted[2]).unwrap();
    assert_eq!(turn["role"], "user");
    assert_eq!(turn["parts"][0]["functionResponse"]["name"], "get_claim");
    assert_eq!(turn["parts"][0]["functionResponse"]["response"]["status"], "open");
    assert_eq!(turn["parts"][1]["functionResponse"]["response"]["result"], "sunny");
}

#[test]
fn test_strip_unsupported_keywords() {
    let mut schema = json!({
        "type": "object",
        "additionalProperties": false,
        "$schema": "http://json-schema.org/draft-07/schema#",
        "properties": {
            "default": {"type": "string", "default": "x"},
            "items": {
                "type": "array",
                "items": {"type": "object", "additionalProperties": true}
            }
        }
    });
    strip_unsupported_keywords(&mut schema);

    assert!(schema.get("additionalProperties").is_none());
    assert!(schema.get("$schema").is_none());
    assert!(schema["properties"].get("default").is_some());
    assert!(schema["properties"]["default"].get("default").is_none());
    assert!(schema["properties"]["items"]["items"]
        .get("additionalProperties")
        .is_none());
}

#[test]
fn test_convert_tools_single_block() {
    let tools = vec![
        ToolDefinition::new("a", "A", json!({"type": "object", "properties": {}})),
        ToolDefinition::new("b", "B", json!({"type": "object", "properties": {}})),
    ];
    let converted = serde_json::to_value(convert_tools(&tools)).unwrap();
    assert_eq!(converted.as_array().unwrap().len(), 1);
    assert_eq!(converted[0]["functionDeclarations"][1]["name"], "b");
}

#[test]
fn test_function_call_reclassified_as_tool_calls() {
    let response: GeminiResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "Checking the claim."},
                    {"functionCall": {"name": "get_claim", "args": {"claim": "C-3"}}},
                    {"executableCode": {"language": "PYTHON", "code": "print(1)"}}
                ]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15},
        "responseId": "resp-1",
        "modelVersion": "gemini-2.5-flash"
    }))
    .unwrap();

    let parsed = parse_response(response, "gemini-2.5-flash").unwrap();
    assert_eq!(parsed.id, "resp-1");
    assert_eq!(parsed.content(), "Checking the claim.");
    assert_eq!(parsed.finish_reason, FinishReason::ToolCalls);
    assert_eq!(parsed.tool_calls().len(), 1);
    assert!(parsed.tool_calls()[0].id.starts_with("call_"));
    assert_eq!(parsed.usage.total_tokens, 15);
}

#[test]
fn test_blocked_prompt_is_invalid_response() {
    let response: GeminiResponse = serde_json::from_value(json!({
        "promptFeedback": {"blockReason": "SAFETY"}
    }))
    .unwrap();
    let err = parse_response(response, "gemini-2.5-flash").unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[test]
fn test_max_tokens_maps_to_length() {
    let response: GeminiResponse = serde_json::from_value(json!({
        "candidates": [{"content": {"parts": [{"text": "cut"}]}, "finishReason": "MAX_TOKENS"}]
    }))
    .unwrap();
    let parsed = parse_response(response, "gemini-2.5-flash").unwrap();
    assert_eq!(parsed.finish_reason, FinishReason::Length);
    assert_eq!(parsed.model, "gemini-2.5-flash");
    assert_eq!(parsed.usage.total_tokens, 0);
}

#[test]
fn test_stream_ends_on_close() {
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hail \"}]}}],\"responseId\":\"r1\"}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"damage likely.\"}]},\"finishReason\":\"STOP\"}],\"responseId\":\"r1\"}\r\n\r\n",
    );

    let chunks = replay(body);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.id == "r1"));
    let text: String = chunks.iter().map(|c| c.delta.as_str()).collect();
    assert_eq!(text, "Hail damage likely.");
    assert_eq!(chunks[2].finish_reason, Some(FinishReason::Stop));
}

#[test]
fn test_stream_function_call() {
    let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"functionCall\":{\"name\":\"get_claim\",\"args\":{\"claim\":\"C-3\"}}}]},\"finishReason\":\"STOP\"}]}\n";
    let chunks = replay(body);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(chunks[0].tool_calls[0].arguments["claim"], "C-3");
    assert!(!chunks[0].id.is_empty());
}

#[test]
fn test_untagged_part_decoding() {
    let part: GeminiPart = serde_json::from_value(json!({"inlineData": {"mimeType": "image/png", "data": "AA=="}})).unwrap();
    assert!(matches!(part, GeminiPart::Other(_)));
}
