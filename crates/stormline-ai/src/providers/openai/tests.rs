use super::convert::{convert_messages, convert_tool, image_message, parse_response};
use super::provider::completion_body;
use super::stream::OpenAiStreamParser;
use super::types::{ChatCompletionResponse, OpenAiConfig, MODELS};
use crate::completion::{ChatRequest, FinishReason, StreamChunk};
use crate::message::Message;
use crate::sse::SseDecoder;
use crate::tools::{ToolCall, ToolDefinition};
use serde_json::json;
use std::time::Duration;

fn replay(body: &str) -> crate::Result<Vec<StreamChunk>> {
    let mut decoder = SseDecoder::new();
    let mut parser = OpenAiStreamParser::new();
    let mut chunks = Vec::new();
    for piece in body.as_bytes().chunks(5) {
        chunks.extend(decoder.feed_into(&mut parser, piece)?);
    }
    chunks.extend(decoder.finish_into(&mut parser)?);
    Ok(chunks)
}

#[test]
fn test_config_builder() {
    let config = OpenAiConfig::new("test-key")
        .with_model("gpt-4o-mini")
        .with_base_url("http://127.0.0.1:8080/v1/")
        .with_timeout(Duration::from_secs(30));

    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.base_url, "http://127.0.0.1:8080/v1");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(MODELS.contains(&"gpt-4o"));
    assert!(MODELS.contains(&"gpt-4o-mini"));
}

#[test]
fn test_config_debug_masks_key() {
    let config = OpenAiConfig::new("sk-1234567890abcdefghijklmnop");
    let debug_str = format!("{:?}", config);

    assert!(!debug_str.contains("1234567890abcdefghijkl"));
    assert!(debug_str.contains("sk-1...mnop"));
}

#[test]
fn test_request_body_shape() {
    let tool = ToolDefinition::new(
        "lookup_claim",
        "Look up an insurance claim",
        json!({"type": "object", "properties": {"claim": {"type": "string"}}}),
    );
    let request = ChatRequest::new(vec![Message::system("Be brief."), Message::user("Status?")])
        .with_tools(vec![tool])
        .with_json_output();

    let body = serde_json::to_value(completion_body("gpt-4o", &request, Some(512), true)).unwrap();

    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["stream"], true);
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "lookup_claim");
    assert!(body.get("temperature").is_none());
    assert!(body.get("search_recency_filter").is_none());
}

#[test]
fn test_system_messages_merge_into_one_turn() {
    let request = ChatRequest::new(vec![
        Message::system("Customer context."),
        Message::system("Be brief."),
        Message::user("Hi"),
    ]);

    let body = serde_json::to_value(completion_body("gpt-4o", &request, None, false)).unwrap();
    let messages = body["messages"].as_array().unwrap();
    let systems = messages.iter().filter(|m| m["role"] == "system").count();

    assert_eq!(systems, 1);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Customer context.\n\nBe brief.");
    assert_eq!(messages[1]["role"], "user");
}

#[test]
fn test_tool_round_trip_messages() {
    let call = ToolCall::new(
        "call_1",
        "lookup_claim",
        json!({"claim": "C-7"}).as_object().cloned().unwrap(),
    );
    let messages = vec![
        Message::user("Status of C-7?"),
        Message::assistant_with_tool_calls("", vec![call.clone()]),
        Message::tool_response(&call, "{\"status\": \"approved\"}"),
    ];

    let converted = serde_json::to_value(convert_messages(&messages)).unwrap();

    assert!(converted[1].get("content").is_none());
    assert_eq!(converted[1]["tool_calls"][0]["id"], "call_1");
    assert_eq!(converted[1]["tool_calls"][0]["function"]["arguments"], "{\"claim\":\"C-7\"}");
    assert_eq!(converted[2]["role"], "tool");
    assert_eq!(converted[2]["tool_call_id"], "call_1");
}

#[test]
fn test_convert_tool_fills_schema() {
    let tool = ToolDefinition::new("ping", "Ping", json!({"properties": {}}));
    let converted = serde_json::to_value(convert_tool(&tool)).unwrap();
    assert_eq!(converted["function"]["parameters"]["type"], "object");
}

#[test]
fn test_image_message_parts() {
    let message = serde_json::to_value(image_message("Inspect", "data:image/png;base64,AAA".into())).unwrap();
    assert_eq!(message["role"], "user");
    assert_eq!(message["content"][0]["type"], "text");
    assert_eq!(message["content"][1]["type"], "image_url");
    assert_eq!(message["content"][1]["image_url"]["url"], "data:image/png;base64,AAA");
}

#[test]
fn test_parse_response_drops_malformed_tool_call() {
    let response: ChatCompletionResponse = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o",
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [
                    {"id": "call_a", "type": "function", "function": {"name": "lookup_claim", "arguments": "{\"claim\": \"C-7\"}"}},
                    {"id": "call_b", "type": "function", "function": {"name": "broken", "arguments": "{\"claim\": "}}
                ]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29}
    }))
    .unwrap();

    let parsed = parse_response(response).unwrap();
    assert_eq!(parsed.id, "chatcmpl-1");
    assert_eq!(parsed.content(), "");
    assert_eq!(parsed.tool_calls().len(), 1);
    assert_eq!(parsed.tool_calls()[0].name, "lookup_claim");
    assert_eq!(parsed.finish_reason, FinishReason::ToolCalls);
    assert_eq!(parsed.usage.total_tokens, 29);
}

#[test]
fn test_parse_response_without_choices() {
    let response: ChatCompletionResponse =
        serde_json::from_value(json!({"id": "x", "model": "gpt-4o", "choices": []})).unwrap();
    assert!(parse_response(response).is_err());
}

#[test]
fn test_stream_text_ends_on_done() {
    let body = concat!(
        "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
    );

    let chunks = replay(body).unwrap();
    let deltas: Vec<&str> = chunks.iter().map(|c| c.delta.as_str()).collect();
    assert_eq!(deltas, vec!["Hel", "lo"]);
    assert!(chunks.iter().all(|c| c.id == "c1"));
}

#[test]
fn test_stream_matches_non_streaming_content() {
    let body = concat!(
        "data: {\"id\":\"c2\",\"choices\":[{\"delta\":{\"content\":\"Your roof \"}}]}\n",
        "data: {\"id\":\"c2\",\"choices\":[{\"delta\":{\"content\":\"looks fine.\"},\"finish_reason\":\"stop\"}]}\n",
        "data: {\"id\":\"c2\",\"choices\":[],\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":4}}\n",
        "data: [DONE]\n",
    );
    let response: ChatCompletionResponse = serde_json::from_value(json!({
        "id": "c2",
        "model": "gpt-4o",
        "choices": [{"message": {"content": "Your roof looks fine."}, "finish_reason": "stop"}]
    }))
    .unwrap();

    let chunks = replay(body).unwrap();
    let streamed: String = chunks.iter().map(|c| c.delta.as_str()).collect();
    assert_eq!(streamed, parse_response(response).unwrap().content());
    assert_eq!(chunks.last().unwrap().finish_reason, Some(FinishReason::Stop));
}

#[test]
fn test_stream_merges_tool_call_fragments() {
    let body = concat!(
        "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_x\",\"type\":\"function\",\"function\":{\"name\":\"lookup_claim\",\"arguments\":\"\"}}]}}]}\n",
        "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"cla\"}}]}}]}\n",
        "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"im\\\":\\\"C-7\\\"}\"}}]}}]}\n",
        "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"call_y\",\"function\":{\"name\":\"broken\",\"arguments\":\"{oops\"}}]}}]}\n",
        "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n",
        "data: [DONE]\n",
    );

    let chunks = replay(body).unwrap();
    assert_eq!(chunks.len(), 1);
    let last = &chunks[0];
    assert_eq!(last.id, "c3");
    assert_eq!(last.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(last.tool_calls.len(), 1);
    assert_eq!(last.tool_calls[0].id, "call_x");
    assert_eq!(last.tool_calls[0].arguments["claim"], "C-7");
}

#[test]
fn test_stream_error_frame() {
    let err = replay("data: {\"error\":{\"message\":\"Rate limit reached\",\"type\":\"rate_limit_error\"}}\n")
        .unwrap_err();
    assert!(err.to_string().contains("Rate limit reached"));
}

#[test]
fn test_stream_closed_without_done() {
    let chunks = replay("data: {\"id\":\"c4\",\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}").unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].delta, "partial");
}
