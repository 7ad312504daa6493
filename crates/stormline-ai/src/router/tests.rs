//! Tests for router module

use super::*;
use crate::completion::{
    ChatRequest, ClassifyRequest, FinishReason, ParseRequest, ResearchRequest,
};
use crate::context::{CustomerContext, CustomerInfo};
use crate::error::Error;
use crate::message::{Message, MessageRole};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

fn router_with(adapters: Vec<Arc<MockAdapter>>) -> AiRouter {
    let mut router = AiRouter::new(RouterConfig::default());
    for adapter in adapters {
        router.register_adapter(adapter);
    }
    router
}

fn hello() -> ChatRequest {
    ChatRequest::new(vec![Message::user("Hello")]).with_task(AiTask::Chat)
}

#[test]
fn test_router_starts_empty() {
    let router = AiRouter::new(RouterConfig::default());
    assert_eq!(router.fallback_model(), DEFAULT_FALLBACK_MODEL);
    assert!(router.registered_models().is_empty());
    assert!(!router.has_adapter("gpt-4o"));
}

#[test]
fn test_default_route_table() {
    let routes = RouteTable::default();
    assert_eq!(routes.model_for(AiTask::Chat), "claude-sonnet-4-5");
    assert_eq!(routes.model_for(AiTask::ToolCall), "gpt-4o");
    assert_eq!(routes.model_for(AiTask::SimpleTool), "gpt-4o-mini");
    assert_eq!(routes.model_for(AiTask::Research), "sonar-pro");
    assert_eq!(routes.model_for(AiTask::Classify), "gemini-2.5-flash");
    assert_eq!(routes.model_for(AiTask::Parse), "gemini-2.5-flash");
    assert_eq!(routes.model_for(AiTask::Summarize), "kimi-k2-0905-preview");
    assert_eq!(routes.iter().count(), AiTask::ALL.len());
}

#[test]
fn test_route_overrides() {
    let config = RouterConfig::default()
        .with_task_model(AiTask::Chat, "gpt-4.1")
        .with_task_model(AiTask::Summarize, "   ");
    let router = AiRouter::new(config);

    assert_eq!(router.routes().model_for(AiTask::Chat), "gpt-4.1");
    // Blank overrides keep the built-in route
    assert_eq!(
        router.routes().model_for(AiTask::Summarize),
        "kimi-k2-0905-preview"
    );
}

#[test]
fn test_provider_for_model() {
    assert_eq!(provider_for_model("claude-sonnet-4-5"), Some(ProviderKind::Anthropic));
    assert_eq!(provider_for_model("gpt-4o-mini"), Some(ProviderKind::OpenAi));
    assert_eq!(provider_for_model("o3-mini"), Some(ProviderKind::OpenAi));
    assert_eq!(provider_for_model("kimi-k2-0905-preview"), Some(ProviderKind::Moonshot));
    assert_eq!(provider_for_model("moonshot-v1-128k"), Some(ProviderKind::Moonshot));
    assert_eq!(provider_for_model("Gemini-2.5-Pro"), Some(ProviderKind::Gemini));
    assert_eq!(provider_for_model("sonar-pro"), Some(ProviderKind::Perplexity));
    assert_eq!(provider_for_model("llama3"), None);
    assert_eq!(provider_for_model("o3x"), None);
}

#[test]
fn test_ai_task_parse_and_serde() {
    assert_eq!("tool_call".parse::<AiTask>().unwrap(), AiTask::ToolCall);
    assert_eq!(" Research ".parse::<AiTask>().unwrap(), AiTask::Research);
    assert!("translate".parse::<AiTask>().is_err());

    assert_eq!(serde_json::to_value(AiTask::SimpleTool).unwrap(), json!("simple_tool"));
    let task: AiTask = serde_json::from_value(json!("summarize")).unwrap();
    assert_eq!(task, AiTask::Summarize);
    assert_eq!(serde_json::to_value(ProviderKind::OpenAi).unwrap(), json!("openai"));
}

#[test]
fn test_router_config_deserialize() {
    let config: RouterConfig = serde_json::from_value(json!({
        "task_models": {"research": "sonar"},
        "timeout_secs": 30
    }))
    .unwrap();
    assert_eq!(config.fallback_model, DEFAULT_FALLBACK_MODEL);
    assert_eq!(config.task_models.get(&AiTask::Research).map(String::as_str), Some("sonar"));
    assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(30)));
}

#[test]
fn test_capability_labels() {
    assert_eq!(Capabilities::STREAM.label(), "streaming");
    assert_eq!(Capabilities::RESEARCH.label(), "research");
    assert_eq!((Capabilities::CHAT | Capabilities::TOOLS).label(), "capabilities");
}

#[tokio::test]
async fn test_preferred_adapter_is_used() {
    let claude = Arc::new(MockAdapter::new("claude-sonnet-4-5"));
    let gpt = Arc::new(MockAdapter::new("gpt-4o"));
    let router = router_with(vec![Arc::clone(&claude), Arc::clone(&gpt)]);

    let response = router.chat(hello()).await.unwrap();
    assert_eq!(response.model, "claude-sonnet-4-5");
    assert_eq!(claude.call_count(), 1);
    assert_eq!(gpt.call_count(), 0);
}

#[tokio::test]
async fn test_fallback_invariant() {
    // Only the fallback is registered; every task resolves to it
    let fallback = Arc::new(MockAdapter::new(DEFAULT_FALLBACK_MODEL));
    let router = router_with(vec![Arc::clone(&fallback)]);

    for task in AiTask::ALL {
        let response = router
            .chat(ChatRequest::new(vec![Message::user("hi")]).with_task(task))
            .await
            .unwrap();
        assert_eq!(response.model, DEFAULT_FALLBACK_MODEL);
    }
    assert_eq!(fallback.call_count(), AiTask::ALL.len());
}

#[tokio::test]
async fn test_example_scenario_fallback_only() {
    let router = router_with(vec![Arc::new(MockAdapter::new("gpt-4o"))]);

    let response = router.chat(hello()).await.unwrap();
    assert_eq!(response.model, "gpt-4o");
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.message.role, MessageRole::Assistant);
}

#[tokio::test]
async fn test_no_adapter_invariant() {
    // Registered, but neither preferred for chat nor the fallback
    let stray = Arc::new(MockAdapter::new("sonar-pro"));
    let router = router_with(vec![Arc::clone(&stray)]);

    let err = router.chat(hello()).await.unwrap_err();
    assert!(matches!(err, Error::NoAdapterAvailable(ref task) if task == "chat"));
    assert!(router.chat_stream(hello()).is_err());
    assert_eq!(stray.call_count(), 0);
}

#[tokio::test]
async fn test_adapter_error_propagates() {
    let adapter = Arc::new(MockAdapter::new("gpt-4o"));
    adapter.push(Err(Error::Provider {
        provider: "openai".into(),
        status: 529,
        body: "overloaded".into(),
    }));
    let router = router_with(vec![adapter]);

    let err = router.chat(hello()).await.unwrap_err();
    assert_eq!(err.status(), Some(529));
}

#[tokio::test]
async fn test_task_defaults_applied() {
    let adapter = Arc::new(MockAdapter::new("gpt-4o"));
    let router = router_with(vec![Arc::clone(&adapter)]);

    router
        .chat(hello().with_task(AiTask::Summarize))
        .await
        .unwrap();
    let sent = adapter.last_request().unwrap();
    assert_eq!(sent.max_tokens, Some(1500));
    assert_eq!(sent.temperature, Some(0.3));

    // Caller values win
    router
        .chat(hello().with_max_tokens(42).with_temperature(0.9))
        .await
        .unwrap();
    let sent = adapter.last_request().unwrap();
    assert_eq!(sent.max_tokens, Some(42));
    assert_eq!(sent.temperature, Some(0.9));
}

#[tokio::test]
async fn test_chat_stream_reconstructs_content() {
    let adapter = Arc::new(MockAdapter::new("gpt-4o"));
    adapter.push_text("storm damage on the north slope");
    let router = router_with(vec![Arc::clone(&adapter)]);

    let mut stream = router.chat_stream(hello()).unwrap();
    let mut content = String::new();
    let mut finish = None;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        content.push_str(&chunk.delta);
        finish = chunk.finish_reason.or(finish);
    }
    assert_eq!(content, "storm damage on the north slope");
    assert_eq!(finish, Some(FinishReason::Stop));
    assert!(adapter.last_request().unwrap().stream);
}

#[tokio::test]
async fn test_chat_stream_unsupported() {
    let adapter = Arc::new(MockAdapter::new("gpt-4o").with_capabilities(Capabilities::CHAT));
    let router = router_with(vec![Arc::clone(&adapter)]);

    let err = router.chat_stream(hello()).err().unwrap();
    assert!(matches!(
        err,
        Error::UnsupportedCapability { ref adapter, ref capability }
            if adapter == "gpt-4o" && capability == "streaming"
    ));
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn test_chat_with_context_prepends_system_prompt() {
    let adapter = Arc::new(MockAdapter::new("claude-sonnet-4-5"));
    let router = router_with(vec![Arc::clone(&adapter)]);

    let context = CustomerContext {
        customer: Some(CustomerInfo {
            name: "Dana Reyes".into(),
            ..Default::default()
        }),
        ..Default::default()
    };
    router
        .chat_with_context(vec![Message::user("Draft a follow-up text")], &context, AiTask::Chat)
        .await
        .unwrap();

    let sent = adapter.last_request().unwrap();
    assert_eq!(sent.messages.len(), 2);
    assert_eq!(sent.messages[0].role, MessageRole::System);
    assert!(sent.messages[0].content.contains("Dana Reyes"));
    assert_eq!(sent.messages[1].content, "Draft a follow-up text");
}

#[tokio::test]
async fn test_research_native() {
    let sonar = Arc::new(
        MockAdapter::new("sonar-pro")
            .with_provider(ProviderKind::Perplexity)
            .with_capabilities(Capabilities::CHAT | Capabilities::RESEARCH),
    );
    sonar.push_text("Hail hit Plano on May 2 [NWS](https://www.weather.gov/fwd/).");
    let router = router_with(vec![sonar]);

    let result = router
        .research(ResearchRequest::new("recent hail in Plano"))
        .await
        .unwrap();
    assert_eq!(result.citations.len(), 1);
    assert_eq!(result.citations[0].url, "https://www.weather.gov/fwd/");
}

#[tokio::test]
async fn test_research_emulated_has_no_citations() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    fallback.push_text("See [NWS](https://www.weather.gov/) for details.");
    let router = router_with(vec![Arc::clone(&fallback)]);

    let result = router
        .research(ResearchRequest::new("recent hail in Plano"))
        .await
        .unwrap();
    assert!(result.answer.contains("NWS"));
    assert!(result.citations.is_empty());

    let sent = fallback.last_request().unwrap();
    assert_eq!(sent.task(), AiTask::Research);
    assert_eq!(sent.messages[0].role, MessageRole::System);
}

#[tokio::test]
async fn test_classify_emulated() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    fallback.push_text(r#"```json
{"categories": [{"label": "hot", "confidence": 0.3}, {"label": "WARM", "confidence": 0.8}]}
```"#);
    let router = router_with(vec![Arc::clone(&fallback)]);

    let result = router
        .classify(ClassifyRequest::new("Call me tomorrow", ["hot", "warm", "cold"]))
        .await
        .unwrap();
    assert_eq!(result.top().unwrap().label, "warm");
    assert_eq!(result.categories.len(), 2);
    assert!(fallback.last_request().unwrap().json_output);
}

#[tokio::test]
async fn test_degraded_classify() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    fallback.push_text("I think this lead is probably warm.");
    let router = router_with(vec![fallback]);

    let result = router
        .classify(ClassifyRequest::new("Call me tomorrow", ["hot", "warm", "cold"]))
        .await
        .unwrap();
    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.categories[0].label, "hot");
    assert_eq!(result.categories[0].confidence, 0.5);
}

#[tokio::test]
async fn test_classify_native() {
    let gemini = Arc::new(
        MockAdapter::new("gemini-2.5-flash")
            .with_capabilities(Capabilities::CHAT | Capabilities::CLASSIFY),
    );
    gemini.push_text(r#"{"label": "cold", "confidence": 0.9}"#);
    let router = router_with(vec![Arc::clone(&gemini)]);

    let result = router
        .classify(ClassifyRequest::new("Not interested", ["hot", "warm", "cold"]))
        .await
        .unwrap();
    assert_eq!(result.top().unwrap().label, "cold");
    // Native path never goes through chat
    assert!(gemini.last_request().is_none());
}

#[tokio::test]
async fn test_parse_emulated() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    fallback.push_text(r#"Here you go: {"carrier": "State Farm", "claim": "CLM-1", "confidence": 0.75}"#);
    let router = router_with(vec![fallback]);

    let result = router
        .parse(ParseRequest::new(
            "State Farm claim CLM-1",
            json!({"type": "object", "properties": {"carrier": {"type": "string"}}}),
        ))
        .await
        .unwrap();
    assert_eq!(result.data, json!({"carrier": "State Farm", "claim": "CLM-1"}));
    assert_eq!(result.confidence, 0.75);
}

#[tokio::test]
async fn test_degraded_parse() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    let router = router_with(vec![Arc::clone(&fallback)]);

    for junk in ["not json at all", "[1, 2, 3]", "{\"unterminated\": "] {
        fallback.push_text(junk);
        let result = router
            .parse(ParseRequest::new("anything", json!({"type": "object"})))
            .await
            .unwrap();
        assert_eq!(result.data, json!({}));
        assert_eq!(result.confidence, 0.0);
    }
}

#[tokio::test]
async fn test_parse_native() {
    let gemini = Arc::new(
        MockAdapter::new("gemini-2.5-flash")
            .with_capabilities(Capabilities::CHAT | Capabilities::PARSE),
    );
    gemini.push_text(r#"{"roof_type": "asphalt"}"#);
    let router = router_with(vec![gemini]);

    let result = router
        .parse(ParseRequest::new("asphalt shingles", json!({"type": "object"})))
        .await
        .unwrap();
    assert_eq!(result.data, json!({"roof_type": "asphalt"}));
    assert_eq!(result.confidence, 1.0);
}

#[tokio::test]
async fn test_emulation_surfaces_transport_errors() {
    let fallback = Arc::new(MockAdapter::new("gpt-4o"));
    fallback.push(Err(Error::Timeout(1000)));
    let router = router_with(vec![fallback]);

    let err = router
        .classify(ClassifyRequest::new("x", ["a"]))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn test_builder_registers_fallback() {
    let router = RouterBuilder::new(RouterConfig::default().with_fallback_model("gpt-4o-mini"))
        .adapter(Arc::new(MockAdapter::new("gpt-4o-mini")))
        .adapter(Arc::new(MockAdapter::new("sonar-pro")))
        .build();

    assert_eq!(router.registered_models(), vec!["gpt-4o-mini", "sonar-pro"]);
    let resolved = router.resolve(AiTask::Chat).unwrap();
    assert_eq!(resolved.model_id(), "gpt-4o-mini");
    assert_eq!(router.resolve(AiTask::Research).unwrap().model_id(), "sonar-pro");
}

#[tokio::test]
async fn test_router_is_shareable_across_tasks() {
    let adapter = Arc::new(MockAdapter::new("gpt-4o"));
    let router = Arc::new(router_with(vec![Arc::clone(&adapter)]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.chat(hello()).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(adapter.call_count(), 8);
}
