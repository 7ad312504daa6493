//! Structured-output helpers for classify, parse, and research
//!
//! Shared by adapters with a native JSON mode and by the router when it
//! emulates a capability over plain chat. Every parser here degrades to a
//! low-confidence result instead of failing.

use crate::completion::{
    CategoryScore, ChatRequest, Citation, ClassifyRequest, ClassifyResult, ParseRequest,
    ParseResult, ResearchRequest,
};
use crate::message::Message;
use crate::router::AiTask;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Confidence assigned to the fallback category when output can't be read
pub const DEGRADED_CLASSIFY_CONFIDENCE: f32 = 0.5;

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)")
        .expect("MARKDOWN_LINK is a compile-time constant")
});

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>()\[\]"']+"#).expect("BARE_URL is a compile-time constant")
});

/// Remove a surrounding Markdown code fence, if any
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Find the first JSON object in model output.
///
/// Tries the fence-stripped text as a whole first, then the first balanced
/// `{...}` span (string literals and escapes are respected while counting).
#[must_use]
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let stripped = strip_code_fences(text);
    if let Ok(Value::Object(map)) = serde_json::from_str(stripped) {
        return Some(map);
    }

    let start = stripped.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in stripped[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &stripped[start..=start + offset];
                    return match serde_json::from_str(candidate) {
                        Ok(Value::Object(map)) => Some(map),
                        _ => None,
                    };
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// Prompts
// ============================================================================

/// User prompt asking for a JSON classification
#[must_use]
pub fn classify_prompt(request: &ClassifyRequest) -> String {
    let mut prompt = format!(
        "Classify the text below into one or more of these categories: {}.\n",
        request.categories.join(", ")
    );
    if let Some(instructions) = &request.instructions {
        prompt.push_str(instructions);
        prompt.push('\n');
    }
    prompt.push_str(
        "Respond with JSON only, in the form \
         {\"categories\": [{\"label\": \"<category>\", \"confidence\": <0.0-1.0>}]}, \
         most likely category first. Use only the listed category names.\n\nText:\n",
    );
    prompt.push_str(&request.text);
    prompt
}

/// User prompt asking for schema-shaped JSON extraction
#[must_use]
pub fn parse_prompt(request: &ParseRequest) -> String {
    let schema = serde_json::to_string_pretty(&request.schema)
        .unwrap_or_else(|_| request.schema.to_string());
    let mut prompt = format!(
        "Extract structured data from the text below. The output must be one JSON object \
         matching this JSON schema:\n{schema}\n"
    );
    if let Some(instructions) = &request.instructions {
        prompt.push_str(instructions);
        prompt.push('\n');
    }
    prompt.push_str(
        "Add a top-level \"confidence\" number between 0 and 1. \
         Use null for fields the text does not mention. Respond with JSON only.\n\nText:\n",
    );
    prompt.push_str(&request.text);
    prompt
}

/// System prompt for research over plain chat
#[must_use]
pub fn research_system_prompt(request: &ResearchRequest) -> String {
    let mut prompt = String::from(
        "You are a research assistant. Answer factually and concisely. \
         Cite every source inline as a Markdown link [title](url).",
    );
    if let Some(recency) = request.recency {
        prompt.push_str(&format!(
            " Prefer sources published within the last {}.",
            recency.as_str()
        ));
    }
    if let Some(context) = &request.context {
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(context);
    }
    prompt
}

/// Chat request carrying a classification prompt
#[must_use]
pub fn classify_chat_request(request: &ClassifyRequest) -> ChatRequest {
    ChatRequest::new(vec![
        Message::system("You are a precise text classifier. Output JSON only."),
        Message::user(classify_prompt(request)),
    ])
    .with_task(AiTask::Classify)
    .with_json_output()
    .with_task_defaults()
}

/// Chat request carrying an extraction prompt
#[must_use]
pub fn parse_chat_request(request: &ParseRequest) -> ChatRequest {
    ChatRequest::new(vec![
        Message::system("You extract structured data from text. Output JSON only."),
        Message::user(parse_prompt(request)),
    ])
    .with_task(AiTask::Parse)
    .with_json_output()
    .with_task_defaults()
}

/// Chat request carrying a research question
#[must_use]
pub fn research_chat_request(request: &ResearchRequest) -> ChatRequest {
    let mut chat = ChatRequest::new(vec![
        Message::system(research_system_prompt(request)),
        Message::user(request.query.clone()),
    ])
    .with_task(AiTask::Research);
    chat.max_tokens = request.max_tokens;
    chat.with_task_defaults()
}

// ============================================================================
// Output parsing
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationShape {
    Wrapped { categories: Vec<RawScore> },
    List(Vec<RawScore>),
    Single(RawScore),
}

#[derive(Deserialize)]
struct RawScore {
    #[serde(alias = "category", alias = "name")]
    label: String,
    #[serde(default = "default_confidence", alias = "score")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

fn read_classification(text: &str) -> Option<Vec<RawScore>> {
    let stripped = strip_code_fences(text);
    let shape = serde_json::from_str::<ClassificationShape>(stripped)
        .ok()
        .or_else(|| {
            extract_json_object(stripped)
                .and_then(|map| serde_json::from_value(Value::Object(map)).ok())
        })?;
    Some(match shape {
        ClassificationShape::Wrapped { categories } | ClassificationShape::List(categories) => {
            categories
        }
        ClassificationShape::Single(score) => vec![score],
    })
}

/// Read classifier output, keeping only requested labels.
///
/// Labels are matched case-insensitively and returned in the caller's
/// spelling, sorted by confidence. Unreadable output, or output naming none
/// of the requested labels, degrades to the first category at
/// [`DEGRADED_CLASSIFY_CONFIDENCE`].
#[must_use]
pub fn parse_classification(text: &str, categories: &[String]) -> ClassifyResult {
    if categories.is_empty() {
        return ClassifyResult::default();
    }

    let mut scores: Vec<CategoryScore> = Vec::new();
    for raw in read_classification(text).unwrap_or_default() {
        let Some(label) = categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw.label.trim()))
        else {
            continue;
        };
        if scores.iter().any(|s| &s.label == label) {
            continue;
        }
        let confidence = if raw.confidence.is_finite() {
            raw.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        scores.push(CategoryScore {
            label: label.clone(),
            confidence,
        });
    }

    if scores.is_empty() {
        debug!("Classifier output unusable, degrading to first category");
        return ClassifyResult {
            categories: vec![CategoryScore {
                label: categories[0].clone(),
                confidence: DEGRADED_CLASSIFY_CONFIDENCE,
            }],
        };
    }

    scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ClassifyResult { categories: scores }
}

/// Read extraction output into `{data, confidence}`.
///
/// A top-level `confidence` or `_confidence` number is lifted out of the
/// data. Anything that is not a JSON object yields `{}` at confidence 0.
#[must_use]
pub fn parse_structured(text: &str) -> ParseResult {
    let Some(mut data) = extract_json_object(text) else {
        debug!("Extraction output is not a JSON object");
        return ParseResult::default();
    };

    let mut confidence = 1.0_f32;
    for key in ["confidence", "_confidence"] {
        if let Some(value) = data.get(key).and_then(Value::as_f64) {
            confidence = (value as f32).clamp(0.0, 1.0);
            data.remove(key);
            break;
        }
    }

    ParseResult {
        data: Value::Object(data),
        confidence,
    }
}

fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(without_scheme)
        .trim_start_matches("www.")
        .to_string()
}

fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

/// Collect citations for a research answer, deduplicated by URL.
///
/// Structured search results win, then a bare URL list (titled by host),
/// then links found in the answer text itself.
#[must_use]
pub fn extract_citations(
    answer: &str,
    search_results: &[Citation],
    citation_urls: &[String],
) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut citations = Vec::new();
    let mut push = |citation: Citation| {
        if !citation.url.is_empty() && seen.insert(citation.url.clone()) {
            citations.push(citation);
        }
    };

    if !search_results.is_empty() {
        search_results.iter().cloned().for_each(&mut push);
    } else if !citation_urls.is_empty() {
        for url in citation_urls {
            push(Citation {
                title: host_of(url),
                url: url.clone(),
                snippet: String::new(),
            });
        }
    } else {
        for caps in MARKDOWN_LINK.captures_iter(answer) {
            push(Citation {
                title: caps[1].trim().to_string(),
                url: trim_url(&caps[2]).to_string(),
                snippet: String::new(),
            });
        }
        for found in BARE_URL.find_iter(answer) {
            let url = trim_url(found.as_str());
            push(Citation {
                title: host_of(url),
                url: url.to_string(),
                snippet: String::new(),
            });
        }
    }
    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels() -> Vec<String> {
        vec!["hail".into(), "wind".into(), "none".into()]
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_object_from_prose() {
        let text = "Sure! Here it is: {\"note\": \"brace } inside\", \"n\": {\"x\": 2}} Hope that helps.";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["note"], "brace } inside");
        assert_eq!(map["n"]["x"], 2);

        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{\"unterminated\": ").is_none());
    }

    #[test]
    fn test_parse_classification_shapes() {
        let wrapped = parse_classification(
            r#"{"categories": [{"label": "wind", "confidence": 0.3}, {"label": "HAIL", "confidence": 0.9}]}"#,
            &labels(),
        );
        assert_eq!(wrapped.top().unwrap().label, "hail");
        assert_eq!(wrapped.categories.len(), 2);

        let list = parse_classification(r#"[{"label": "none", "confidence": 1.7}]"#, &labels());
        assert_eq!(list.categories[0].confidence, 1.0);

        let single = parse_classification("```json\n{\"label\": \"wind\"}\n```", &labels());
        assert_eq!(single.top().unwrap().label, "wind");
        assert_eq!(single.top().unwrap().confidence, 1.0);
    }

    #[test]
    fn test_parse_classification_degrades() {
        let garbage = parse_classification("I think it's hail", &labels());
        assert_eq!(garbage.categories.len(), 1);
        assert_eq!(garbage.categories[0].label, "hail");
        assert_eq!(garbage.categories[0].confidence, DEGRADED_CLASSIFY_CONFIDENCE);

        let unknown = parse_classification(r#"{"label": "flood", "confidence": 0.9}"#, &labels());
        assert_eq!(unknown.categories[0].label, "hail");

        assert!(parse_classification("{}", &[]).categories.is_empty());
    }

    #[test]
    fn test_parse_structured() {
        let result = parse_structured(r#"{"name": "Dana", "roof_age": 14, "confidence": 0.8}"#);
        assert_eq!(result.data, json!({"name": "Dana", "roof_age": 14}));
        assert!((result.confidence - 0.8).abs() < f32::EPSILON);

        let no_confidence = parse_structured(r#"{"name": "Dana"}"#);
        assert_eq!(no_confidence.confidence, 1.0);

        let degraded = parse_structured("not json at all");
        assert_eq!(degraded.data, json!({}));
        assert_eq!(degraded.confidence, 0.0);

        let array = parse_structured("[1, 2, 3]");
        assert_eq!(array.data, json!({}));
    }

    #[test]
    fn test_extract_citations_precedence() {
        let structured = vec![Citation {
            title: "NOAA Storm Events".into(),
            url: "https://www.ncdc.noaa.gov/stormevents/".into(),
            snippet: "Hail 1.75in".into(),
        }];
        let urls = vec!["https://example.com/a".to_string()];

        let from_results = extract_citations("", &structured, &urls);
        assert_eq!(from_results.len(), 1);
        assert_eq!(from_results[0].title, "NOAA Storm Events");

        let from_urls = extract_citations("", &[], &urls);
        assert_eq!(from_urls[0].title, "example.com");
    }

    #[test]
    fn test_extract_citations_from_text() {
        let answer = "Hail hit Plano [NWS report](https://weather.gov/fwd/hail). \
                      See also https://www.spc.noaa.gov/climo/reports/, and \
                      https://weather.gov/fwd/hail again.";
        let citations = extract_citations(answer, &[], &[]);

        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].title, "NWS report");
        assert_eq!(citations[0].url, "https://weather.gov/fwd/hail");
        assert_eq!(citations[1].title, "spc.noaa.gov");
        assert_eq!(citations[1].url, "https://www.spc.noaa.gov/climo/reports/");
    }
}
