use super::*;
use crate::completion::SearchRecency;
use crate::message::Message;
use crate::tools::ToolDefinition;
use serde_json::json;

#[test]
fn test_config_builder() {
    let config = PerplexityConfig::new("pplx-test-key")
        .with_model("sonar")
        .with_base_url("http://localhost:3000/")
        .with_timeout(Duration::from_secs(20));

    assert_eq!(config.model, "sonar");
    assert_eq!(config.base_url, "http://localhost:3000");
    assert_eq!(config.timeout, Duration::from_secs(20));
    assert!(MODELS.contains(&DEFAULT_MODEL));
}

#[test]
fn test_config_debug_masks_key() {
    let config = PerplexityConfig::new("pplx-1234567890abcdefghij");
    let debug_str = format!("{:?}", config);
    assert!(!debug_str.contains("1234567890"));
}

#[test]
fn test_body_omits_tools_and_merges_system() {
    let provider = PerplexityProvider::new(PerplexityConfig::new("pplx-test-key-123")).unwrap();
    let request = ChatRequest::new(vec![
        Message::system("Be factual."),
        Message::user("Latest hail reports for Plano?"),
        Message::system("Cite sources."),
    ])
    .with_tools(vec![ToolDefinition::new("x", "X", json!({}))])
    .with_json_output();

    let body = serde_json::to_value(provider.body(&request, false)).unwrap();
    assert!(body.get("tools").is_none());
    assert!(body.get("response_format").is_none());
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["content"], "Be factual.\n\nCite sources.");
    assert_eq!(body["messages"][1]["role"], "user");
}

#[test]
fn test_research_request_carries_recency() {
    let provider = PerplexityProvider::new(PerplexityConfig::new("pplx-test-key-123")).unwrap();
    let request = ResearchRequest::new("hail Plano TX").with_recency(SearchRecency::Week);
    let mut body = provider.body(&structured::research_chat_request(&request), false);
    body.search_recency_filter = request.recency.map(|r| r.as_str());

    let body = serde_json::to_value(body).unwrap();
    assert_eq!(body["search_recency_filter"], "week");
    assert_eq!(body["max_tokens"], 1500);
}

#[test]
fn test_research_result_prefers_search_results() {
    let response: PerplexityResponse = serde_json::from_value(json!({
        "id": "pplx-1",
        "model": "sonar-pro",
        "choices": [{"message": {"content": "Hail of 1.75in fell on May 3 [1]."}, "finish_reason": "stop"}],
        "citations": ["https://www.weather.gov/fwd/", "https://www.spc.noaa.gov/"],
        "search_results": [
            {"title": "NWS Fort Worth", "url": "https://www.weather.gov/fwd/", "snippet": "Severe storms"},
            {"title": "NWS Fort Worth (dup)", "url": "https://www.weather.gov/fwd/"}
        ]
    }))
    .unwrap();

    let result = research_result(response).unwrap();
    assert_eq!(result.answer, "Hail of 1.75in fell on May 3 [1].");
    assert_eq!(result.citations.len(), 1);
    assert_eq!(result.citations[0].title, "NWS Fort Worth");
    assert_eq!(result.citations[0].snippet, "Severe storms");
}

#[test]
fn test_research_result_from_url_list() {
    let response: PerplexityResponse = serde_json::from_value(json!({
        "id": "pplx-2",
        "model": "sonar",
        "choices": [{"message": {"content": "See sources."}, "finish_reason": "stop"}],
        "citations": ["https://www.spc.noaa.gov/climo/reports/"]
    }))
    .unwrap();

    let result = research_result(response).unwrap();
    assert_eq!(result.citations.len(), 1);
    assert_eq!(result.citations[0].title, "spc.noaa.gov");
}

#[test]
fn test_capabilities_exclude_tools() {
    let provider = PerplexityProvider::new(PerplexityConfig::new("pplx-test-key-123")).unwrap();
    assert!(provider.supports(Capabilities::RESEARCH));
    assert!(!provider.supports(Capabilities::TOOLS));
    assert!(!provider.supports(Capabilities::CLASSIFY));
}
